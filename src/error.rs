//! Unified error handling for the route-follower library.
//!
//! The tracking hot path never fails: a fix that matches nothing yields `None`.
//! Errors are reserved for contract violations that the caller asked to have
//! reported (checked distance queries, restoring a saved position, config).

use std::fmt;

/// Unified error type for route-follower operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    /// Route has too few points to be followed
    InsufficientPoints {
        point_count: usize,
        minimum_required: usize,
    },
    /// Position does not address a segment of the current route
    InvalidPosition {
        segment_index: usize,
        segment_count: usize,
    },
    /// Distance was requested with the later position first
    ReversedOrder { from_segment: usize, to_segment: usize },
    /// Configuration error
    ConfigError { message: String },
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::InsufficientPoints {
                point_count,
                minimum_required,
            } => {
                write!(
                    f,
                    "Route has {} points, minimum {} required",
                    point_count, minimum_required
                )
            }
            TrackError::InvalidPosition {
                segment_index,
                segment_count,
            } => {
                write!(
                    f,
                    "Position on segment {} is not on a route with {} segments",
                    segment_index, segment_count
                )
            }
            TrackError::ReversedOrder {
                from_segment,
                to_segment,
            } => {
                write!(
                    f,
                    "Distance requested backwards (segment {} to segment {})",
                    from_segment, to_segment
                )
            }
            TrackError::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
        }
    }
}

impl std::error::Error for TrackError {}

impl From<serde_json::Error> for TrackError {
    fn from(err: serde_json::Error) -> Self {
        TrackError::ConfigError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for route-follower operations.
pub type Result<T> = std::result::Result<T, TrackError>;

/// Extension trait for converting Option to TrackError.
pub trait OptionExt<T> {
    /// Convert Option to Result with insufficient points error.
    fn ok_or_insufficient_points(self, point_count: usize, minimum: usize) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_insufficient_points(self, point_count: usize, minimum: usize) -> Result<T> {
        self.ok_or(TrackError::InsufficientPoints {
            point_count,
            minimum_required: minimum,
        })
    }
}
