//! # Route Tracker
//!
//! Owns a route and the traveller's current position on it.
//!
//! ## State
//!
//! The tracker has a single implicit "tracking" state parameterised by the
//! current [`PositionRef`]:
//! - Construction pins it to the first route point.
//! - Accepted projections replace it; misses leave it untouched.
//! - Trimming the route clamps it back onto the remaining geometry.
//!
//! The route is mutated in place (append / pop-back), so the current position
//! is stored as a value and re-validated on every mutation rather than
//! borrowed from the route.

use geo::Rect;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::distance::{check_order, distance_between, SegmentDistances};
use crate::error::{OptionExt, Result, TrackError};
use crate::geo_utils::distance_on_earth;
use crate::matcher::{admissible_projection, hold_forward, ProjectionMatcher};
use crate::polyline::Polyline;
use crate::position::PositionRef;
use crate::spatial::SegmentIndex;
use crate::{Fix, GpsPoint, MercatorPoint, TrackerConfig};

/// Minimum number of points for a route to be followed.
pub const MIN_ROUTE_POINTS: usize = 2;

/// Serializable view of the tracking state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub segment_index: usize,
    pub point: MercatorPoint,
    pub point_count: usize,
    pub distance_from_begin_m: f64,
    pub distance_to_end_m: f64,
    pub total_distance_m: f64,
}

/// Route geometry plus the traveller's current position on it.
#[derive(Debug)]
pub struct RouteTracker {
    route: Polyline,
    distances: SegmentDistances,
    current: PositionRef,
    config: TrackerConfig,

    // Built lazily for re-acquisition
    spatial_index: SegmentIndex,
    spatial_dirty: bool,
}

impl RouteTracker {
    /// Create a tracker with default configuration.
    ///
    /// Never fails: a route with fewer than two points is accepted and
    /// reported by [`is_valid`](Self::is_valid).
    pub fn new(route: Polyline) -> Self {
        let distances = SegmentDistances::build(&route);
        let current = Self::initial_position(&route);
        Self {
            route,
            distances,
            current,
            config: TrackerConfig::default(),
            spatial_index: SegmentIndex::empty(),
            spatial_dirty: true,
        }
    }

    /// Create a tracker with custom configuration.
    pub fn with_config(route: Polyline, config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(route)
        })
    }

    /// Create a tracker from a range of projected points.
    pub fn from_points(points: &[MercatorPoint]) -> Self {
        Self::new(Polyline::from_points(points.to_vec()))
    }

    /// Create a tracker from GPS points, dropping invalid coordinates.
    pub fn from_gps(points: &[GpsPoint]) -> Self {
        let route: Polyline = points
            .iter()
            .filter(|p| p.is_valid())
            .map(MercatorPoint::from_gps)
            .collect();
        Self::new(route)
    }

    fn initial_position(route: &Polyline) -> PositionRef {
        PositionRef::new(0, route.front().unwrap_or_default())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Whether the route has enough points to be followed.
    pub fn is_valid(&self) -> bool {
        self.route.len() >= MIN_ROUTE_POINTS
    }

    pub fn route(&self) -> &Polyline {
        &self.route
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The current position. Meaningless while the route is invalid.
    pub fn current(&self) -> PositionRef {
        self.current
    }

    pub fn begin(&self) -> Option<PositionRef> {
        PositionRef::begin(&self.route)
    }

    pub fn end(&self) -> Option<PositionRef> {
        PositionRef::end(&self.route)
    }

    /// Position pinned at vertex `index` (the end sentinel for the last one).
    pub fn iter_to_index(&self, index: usize) -> Option<PositionRef> {
        if !self.is_valid() {
            return None;
        }
        self.route
            .point(index)
            .map(|point| PositionRef::new(index, point))
    }

    // ========================================================================
    // Geometry Mutation
    // ========================================================================

    /// Append another route's points. The current position is unaffected.
    pub fn append(&mut self, other: &Polyline) {
        let was_empty = self.route.is_empty();
        self.route.append(other);
        self.distances.extend_to(&self.route);
        self.spatial_dirty = true;
        if was_empty {
            self.current = Self::initial_position(&self.route);
        }
        debug!(
            "[RouteTracker] Appended {} points ({} total)",
            other.len(),
            self.route.len()
        );
    }

    /// Remove the last route point, clamping the current position onto the
    /// shortened route if it was on the removed segment.
    pub fn pop_back(&mut self) -> Option<MercatorPoint> {
        let removed = self.route.pop_back()?;
        self.distances.truncate(self.route.len());
        self.spatial_dirty = true;

        let segment_count = self.route.segment_count();
        if segment_count == 0 {
            self.current = Self::initial_position(&self.route);
        } else if self.current.segment_index >= segment_count {
            let last = self.route.back().unwrap_or(removed);
            self.current = PositionRef::new(segment_count - 1, last);
            debug!(
                "[RouteTracker] Clamped current position to segment {}",
                segment_count - 1
            );
        }
        Some(removed)
    }

    /// Exchange the whole state with another tracker.
    pub fn swap(&mut self, other: &mut RouteTracker) {
        std::mem::swap(self, other);
    }

    /// Install a previously saved position after checking it against the
    /// route. The end sentinel is stored as the end of the last segment.
    pub fn restore(&mut self, position: PositionRef) -> Result<()> {
        if !self.is_valid() {
            return Err(TrackError::InsufficientPoints {
                point_count: self.route.len(),
                minimum_required: MIN_ROUTE_POINTS,
            });
        }
        if !position.is_on(&self.route) {
            return Err(TrackError::InvalidPosition {
                segment_index: position.segment_index,
                segment_count: self.route.segment_count(),
            });
        }
        self.current = if position.is_end_of(&self.route) {
            PositionRef::new(self.route.segment_count() - 1, position.point)
        } else {
            position
        };
        Ok(())
    }

    // ========================================================================
    // Projection Updates
    // ========================================================================

    fn matcher(&self) -> ProjectionMatcher<'_> {
        ProjectionMatcher::new(&self.route, &self.distances, &self.config)
    }

    fn accept(&mut self, candidate: Option<PositionRef>, kind: &str) -> Option<PositionRef> {
        match candidate {
            Some(position) => {
                debug!(
                    "[RouteTracker] {} match on segment {} ({:.6}, {:.6})",
                    kind, position.segment_index, position.point.x, position.point.y
                );
                self.current = position;
            }
            None => {
                debug!(
                    "[RouteTracker] {} miss, keeping segment {}",
                    kind, self.current.segment_index
                );
            }
        }
        candidate
    }

    /// Project a fix onto the route ahead of the current position.
    ///
    /// Returns `None` (leaving the current position unchanged) when no
    /// segment in the look-ahead window admits the fix.
    pub fn update_projection(&mut self, fix: &Fix) -> Option<PositionRef> {
        self.update_projection_in_region(&fix.region())
    }

    /// [`update_projection`](Self::update_projection) with an explicit
    /// uncertainty region.
    pub fn update_projection_in_region(&mut self, region: &Rect<f64>) -> Option<PositionRef> {
        if !self.is_valid() {
            warn!(
                "[RouteTracker] Projection requested on a route with {} points",
                self.route.len()
            );
            return None;
        }
        let candidate = self.matcher().update_projection(&self.current, region);
        self.accept(candidate, "Plain")
    }

    /// Project a fix using a predicted travel distance (meters) to bias the
    /// search toward where the traveller should be by now.
    pub fn update_projection_by_prediction(
        &mut self,
        fix: &Fix,
        predicted_distance_m: f64,
    ) -> Option<PositionRef> {
        self.update_projection_by_prediction_in_region(&fix.region(), predicted_distance_m)
    }

    /// [`update_projection_by_prediction`](Self::update_projection_by_prediction)
    /// with an explicit uncertainty region.
    pub fn update_projection_by_prediction_in_region(
        &mut self,
        region: &Rect<f64>,
        predicted_distance_m: f64,
    ) -> Option<PositionRef> {
        if !self.is_valid() {
            warn!(
                "[RouteTracker] Predicted projection requested on a route with {} points",
                self.route.len()
            );
            return None;
        }
        let candidate =
            self.matcher()
                .update_projection_by_prediction(&self.current, region, predicted_distance_m);
        self.accept(candidate, "Predicted")
    }

    /// Re-acquire the traveller anywhere ahead of the current position,
    /// ignoring the look-ahead bound. The admissible projection closest to
    /// the fix wins.
    ///
    /// Intended for hosts that have seen several consecutive misses.
    pub fn relocate(&mut self, fix: &Fix) -> Option<PositionRef> {
        if !self.is_valid() {
            warn!(
                "[RouteTracker] Relocation requested on a route with {} points",
                self.route.len()
            );
            return None;
        }
        if self.spatial_dirty {
            self.spatial_index = SegmentIndex::build(&self.route);
            self.spatial_dirty = false;
        }

        let region = fix.region();
        let candidate = self
            .spatial_index
            .candidates(&region, self.current.segment_index)
            .into_iter()
            .filter_map(|i| admissible_projection(&self.route, &region, i))
            .map(|candidate| hold_forward(&self.route, &self.current, candidate))
            .min_by(|a, b| {
                distance_on_earth(a.point, fix.center)
                    .total_cmp(&distance_on_earth(b.point, fix.center))
                    .then(a.segment_index.cmp(&b.segment_index))
            });
        self.accept(candidate, "Relocated")
    }

    // ========================================================================
    // Distance Queries
    // ========================================================================

    /// Route-following distance in meters from `a` to `b`, reporting any
    /// precondition violation.
    pub fn try_distance_m(&self, a: &PositionRef, b: &PositionRef) -> Result<f64> {
        check_order(&self.route, a, b)?;
        Ok(distance_between(&self.route, &self.distances, a, b))
    }

    /// Route-following distance in meters from `a` to `b`.
    ///
    /// Precondition violations (reversed order, positions off the route, an
    /// invalid route) are logged and yield `0.0`.
    pub fn distance_m(&self, a: &PositionRef, b: &PositionRef) -> f64 {
        match self.try_distance_m(a, b) {
            Ok(distance) => distance,
            Err(e) => {
                warn!("[RouteTracker] Distance query rejected: {}", e);
                0.0
            }
        }
    }

    /// Total route length in meters.
    pub fn total_distance_m(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        self.distances.total()
    }

    /// Distance from the current position to the end of the route.
    pub fn distance_to_end_m(&self) -> f64 {
        match self.end() {
            Some(end) => distance_between(&self.route, &self.distances, &self.current, &end),
            None => 0.0,
        }
    }

    /// Distance from the start of the route to the current position.
    pub fn distance_from_begin_m(&self) -> f64 {
        match self.begin() {
            Some(begin) => distance_between(&self.route, &self.distances, &begin, &self.current),
            None => 0.0,
        }
    }

    // ========================================================================
    // Direction
    // ========================================================================

    /// The first route vertex ahead of the current position that is at least
    /// `tolerance_m` meters further along the route, or the last point if the
    /// route ends first. Consumers derive a heading from it.
    pub fn current_direction_point(&self, tolerance_m: f64) -> Option<MercatorPoint> {
        if !self.is_valid() {
            return None;
        }
        let last = self.route.len() - 1;
        let mut index = (self.current.segment_index + 1).min(last);
        let mut covered = distance_on_earth(self.current.point, self.route.point(index)?);
        while index < last && covered < tolerance_m {
            covered += self.distances.segment_length(index);
            index += 1;
        }
        self.route.point(index)
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Capture the tracking state.
    pub fn snapshot(&self) -> Result<TrackSnapshot> {
        self.begin()
            .ok_or_insufficient_points(self.route.len(), MIN_ROUTE_POINTS)?;
        Ok(TrackSnapshot {
            segment_index: self.current.segment_index,
            point: self.current.point,
            point_count: self.route.len(),
            distance_from_begin_m: self.distance_from_begin_m(),
            distance_to_end_m: self.distance_to_end_m(),
            total_distance_m: self.total_distance_m(),
        })
    }

    /// Tracking state as JSON (`"null"` while the route is invalid).
    pub fn snapshot_json(&self) -> String {
        self.snapshot()
            .ok()
            .and_then(|snapshot| serde_json::to_string(&snapshot).ok())
            .unwrap_or_else(|| "null".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
