//! Distance accumulation along a route.
//!
//! Whole-segment lengths are kept as prefix sums so a distance between two
//! positions costs two partial haversine evaluations and one subtraction,
//! independent of how many segments lie between them.

use crate::error::{Result, TrackError};
use crate::geo_utils::distance_on_earth;
use crate::polyline::Polyline;
use crate::position::PositionRef;

/// Cumulative geodesic distance from the first route point to each vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentDistances {
    cumulative: Vec<f64>,
}

impl SegmentDistances {
    /// Compute prefix sums for every vertex of `route`.
    pub fn build(route: &Polyline) -> Self {
        let mut distances = Self::default();
        distances.extend_to(route);
        distances
    }

    /// Extend the prefix sums to cover points appended to `route` since the
    /// last update. Existing entries are left untouched.
    pub fn extend_to(&mut self, route: &Polyline) {
        let points = route.points();
        if self.cumulative.len() > points.len() {
            self.cumulative.truncate(points.len());
            return;
        }
        for i in self.cumulative.len()..points.len() {
            let value = if i == 0 {
                0.0
            } else {
                self.cumulative[i - 1] + distance_on_earth(points[i - 1], points[i])
            };
            self.cumulative.push(value);
        }
    }

    /// Drop entries beyond `point_count` vertices.
    pub fn truncate(&mut self, point_count: usize) {
        self.cumulative.truncate(point_count);
    }

    /// Distance from the first vertex to vertex `index`.
    pub fn to_vertex(&self, index: usize) -> f64 {
        self.cumulative.get(index).copied().unwrap_or(0.0)
    }

    /// Length of segment `index`.
    pub fn segment_length(&self, index: usize) -> f64 {
        match (self.cumulative.get(index), self.cumulative.get(index + 1)) {
            (Some(start), Some(end)) => end - start,
            _ => 0.0,
        }
    }

    /// Total route length.
    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }
}

/// Check that `a` and `b` can be measured against `route` in that order.
pub fn check_order(route: &Polyline, a: &PositionRef, b: &PositionRef) -> Result<()> {
    if route.segment_count() == 0 {
        return Err(TrackError::InsufficientPoints {
            point_count: route.len(),
            minimum_required: 2,
        });
    }
    for position in [a, b] {
        if !position.is_on(route) {
            return Err(TrackError::InvalidPosition {
                segment_index: position.segment_index,
                segment_count: route.segment_count(),
            });
        }
    }
    if a.segment_index > b.segment_index {
        return Err(TrackError::ReversedOrder {
            from_segment: a.segment_index,
            to_segment: b.segment_index,
        });
    }
    Ok(())
}

/// Route-following distance in meters from `a` to `b`.
///
/// Callers must order the arguments (`a.segment_index <= b.segment_index`)
/// and pass positions on `route`; see [`check_order`]. Positions sharing a
/// segment collapse to a direct point-to-point distance.
pub fn distance_between(
    route: &Polyline,
    distances: &SegmentDistances,
    a: &PositionRef,
    b: &PositionRef,
) -> f64 {
    debug_assert!(a.segment_index <= b.segment_index);
    debug_assert_eq!(distances.len(), route.len());

    if a.segment_index == b.segment_index {
        return distance_on_earth(a.point, b.point);
    }

    let (Some(a_end), Some(b_start)) = (
        route.point(a.segment_index + 1),
        route.point(b.segment_index),
    ) else {
        return 0.0;
    };

    let head = distance_on_earth(a.point, a_end);
    let middle = distances.to_vertex(b.segment_index) - distances.to_vertex(a.segment_index + 1);
    let tail = distance_on_earth(b_start, b.point);
    head + middle + tail
}
