//! Route geometry container.

use serde::{Deserialize, Serialize};

use crate::MercatorPoint;

/// An ordered sequence of projected points forming a route polyline.
///
/// A polyline with fewer than two points has no segments and cannot be
/// followed; it is still a legal value so routes can be built up by
/// appending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<MercatorPoint>,
}

impl Polyline {
    /// Create an empty polyline.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a polyline from points in travel order.
    pub fn from_points(points: Vec<MercatorPoint>) -> Self {
        Self { points }
    }

    /// Create a polyline from `(x, y)` pairs.
    pub fn from_xy(coords: &[(f64, f64)]) -> Self {
        Self {
            points: coords
                .iter()
                .map(|&(x, y)| MercatorPoint::new(x, y))
                .collect(),
        }
    }

    pub fn points(&self) -> &[MercatorPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of segments (`len - 1`, or 0 for fewer than two points).
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn point(&self, index: usize) -> Option<MercatorPoint> {
        self.points.get(index).copied()
    }

    pub fn front(&self) -> Option<MercatorPoint> {
        self.points.first().copied()
    }

    pub fn back(&self) -> Option<MercatorPoint> {
        self.points.last().copied()
    }

    /// Endpoints of segment `index`.
    pub fn segment(&self, index: usize) -> Option<(MercatorPoint, MercatorPoint)> {
        match (self.points.get(index), self.points.get(index + 1)) {
            (Some(&a), Some(&b)) => Some((a, b)),
            _ => None,
        }
    }

    /// Iterate over segments as `(index, start, end)`.
    pub fn segments(&self) -> impl Iterator<Item = (usize, MercatorPoint, MercatorPoint)> + '_ {
        self.points
            .windows(2)
            .enumerate()
            .map(|(i, w)| (i, w[0], w[1]))
    }

    pub fn push(&mut self, point: MercatorPoint) {
        self.points.push(point);
    }

    /// Append another polyline's points, in order.
    pub fn append(&mut self, other: &Polyline) {
        self.points.extend_from_slice(&other.points);
    }

    /// Remove and return the last point.
    pub fn pop_back(&mut self) -> Option<MercatorPoint> {
        self.points.pop()
    }
}

impl From<Vec<MercatorPoint>> for Polyline {
    fn from(points: Vec<MercatorPoint>) -> Self {
        Self::from_points(points)
    }
}

impl FromIterator<MercatorPoint> for Polyline {
    fn from_iter<I: IntoIterator<Item = MercatorPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
