//! # Route Follower
//!
//! Route-following core for turn-by-turn guidance.
//!
//! Given a finished route polyline and a stream of noisy position fixes, this
//! library keeps the best estimate of where the traveller is along the route
//! and answers distance and direction queries relative to that estimate:
//! - Forward-only projection of fixes onto the route, with a bounded look-ahead
//! - Prediction-biased projection that resists GPS jitter
//! - Cumulative geodesic distances between any two positions on the route
//!
//! ## Quick Start
//!
//! ```rust
//! use route_follower::{Fix, MercatorPoint, Polyline, RouteTracker};
//!
//! let route = Polyline::from_xy(&[(0.0, 0.0), (3.0, 0.0), (5.0, 0.0)]);
//! let mut tracker = RouteTracker::new(route);
//!
//! let fix = Fix::new(MercatorPoint::new(4.0, 0.0), 2.0);
//! if let Some(position) = tracker.update_projection(&fix) {
//!     println!("On segment {}", position.segment_index);
//!     println!("{:.0}m to go", tracker.distance_to_end_m());
//! }
//! ```

use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, TrackError};

// Mercator conversion, geodesic distance and segment projection
pub mod geo_utils;

// Route geometry container
pub mod polyline;
pub use polyline::Polyline;

// Position references on a route
pub mod position;
pub use position::PositionRef;

// Prefix-sum distance accumulation
pub mod distance;
pub use distance::SegmentDistances;

// Plain and prediction-biased projection matching
pub mod matcher;
pub use matcher::{predict_distance, predict_distance_from_speed, ProjectionMatcher};

// R-tree of route segments for re-acquisition
pub mod spatial;

// Route tracker facade
pub mod tracker;
pub use tracker::{RouteTracker, TrackSnapshot};

// Mutex-guarded tracker handle
pub mod shared;
pub use shared::SharedTracker;

// ============================================================================
// Core Types
// ============================================================================

/// A point in spherical Mercator coordinates (degrees).
///
/// `x` is longitude, `y` is the Mercator-projected latitude. Route geometry
/// and fixes are both expressed in these units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

impl MercatorPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Project a GPS coordinate.
    pub fn from_gps(point: &GpsPoint) -> Self {
        Self {
            x: point.longitude,
            y: geo_utils::lat_to_y(point.latitude),
        }
    }

    /// Unproject to a GPS coordinate.
    pub fn to_gps(&self) -> GpsPoint {
        GpsPoint::new(geo_utils::y_to_lat(self.y), self.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Coord<f64>> for MercatorPoint {
    fn from(coord: Coord<f64>) -> Self {
        Self::new(coord.x, coord.y)
    }
}

impl From<MercatorPoint> for Coord<f64> {
    fn from(point: MercatorPoint) -> Self {
        Coord {
            x: point.x,
            y: point.y,
        }
    }
}

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use route_follower::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A reported position with its accuracy radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Reported position
    pub center: MercatorPoint,
    /// Reported accuracy in meters
    pub accuracy_m: f64,
}

impl Fix {
    pub fn new(center: MercatorPoint, accuracy_m: f64) -> Self {
        Self { center, accuracy_m }
    }

    /// Create a fix from a GPS reading.
    pub fn from_gps(point: &GpsPoint, accuracy_m: f64) -> Self {
        Self::new(MercatorPoint::from_gps(point), accuracy_m)
    }

    /// The uncertainty region: an axis-aligned rectangle with half-extent
    /// `accuracy_m` around the center.
    pub fn region(&self) -> Rect<f64> {
        geo_utils::rect_by_center_and_radius_m(self.center, self.accuracy_m.max(0.0))
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the projection matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Segments scanned first, starting at the current segment. Prediction
    /// updates scan this many on either side of the predicted segment
    /// (never before the current one).
    /// Default: 3
    pub near_window_segments: usize,

    /// Hard bound on how many segments past the current (or predicted)
    /// segment are ever scanned. Keeps each update proportional to a small
    /// constant instead of the whole route.
    /// Default: 32
    pub lookahead_segments: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            near_window_segments: 3,
            lookahead_segments: 32,
        }
    }
}

impl TrackerConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    ///
    /// # Example
    /// ```
    /// use route_follower::TrackerConfig;
    ///
    /// let config = TrackerConfig::from_json(r#"{"lookahead_segments": 8}"#).unwrap();
    /// assert_eq!(config.lookahead_segments, 8);
    /// assert_eq!(config.near_window_segments, 3);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.near_window_segments == 0 {
            return Err(TrackError::ConfigError {
                message: "near_window_segments must be at least 1".to_string(),
            });
        }
        if self.lookahead_segments < self.near_window_segments {
            return Err(TrackError::ConfigError {
                message: format!(
                    "lookahead_segments ({}) must not be smaller than near_window_segments ({})",
                    self.lookahead_segments, self.near_window_segments
                ),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
