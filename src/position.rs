//! Position references: where on the route the traveller is.
//!
//! A [`PositionRef`] is a plain value, not a borrow into the route. The owning
//! tracker supplies the route whenever a reference is interpreted, and clamps
//! its stored reference whenever the route is trimmed.

use serde::{Deserialize, Serialize};

use crate::geo_utils::is_on_segment;
use crate::polyline::Polyline;
use crate::MercatorPoint;

/// Tolerance (Mercator degrees) for checking that a point lies on its segment.
const ON_SEGMENT_EPSILON: f64 = 1e-9;

/// A location on a route: a segment index plus the exact point on it.
///
/// The end-of-route sentinel uses `segment_index == point_count - 1` with the
/// last route point. Functions that may fail to find a match return
/// `Option<PositionRef>`; `None` is the invalid reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRef {
    pub segment_index: usize,
    pub point: MercatorPoint,
}

impl PositionRef {
    pub fn new(segment_index: usize, point: MercatorPoint) -> Self {
        Self {
            segment_index,
            point,
        }
    }

    /// Reference to the first point of `route`.
    pub fn begin(route: &Polyline) -> Option<Self> {
        if route.segment_count() == 0 {
            return None;
        }
        route.front().map(|p| Self::new(0, p))
    }

    /// End-of-route sentinel for `route`.
    pub fn end(route: &Polyline) -> Option<Self> {
        if route.segment_count() == 0 {
            return None;
        }
        route.back().map(|p| Self::new(route.len() - 1, p))
    }

    /// Whether this is the end sentinel of `route`.
    pub fn is_end_of(&self, route: &Polyline) -> bool {
        route.segment_count() > 0
            && self.segment_index == route.len() - 1
            && route.back() == Some(self.point)
    }

    /// Check that this reference satisfies the route invariants: it addresses
    /// an existing segment (or is the end sentinel) and its point lies on that
    /// closed segment.
    pub fn is_on(&self, route: &Polyline) -> bool {
        if self.is_end_of(route) {
            return true;
        }
        match route.segment(self.segment_index) {
            Some((a, b)) => is_on_segment(self.point, a, b, ON_SEGMENT_EPSILON),
            None => false,
        }
    }
}
