//! R-tree index over route segments.
//!
//! Used only for whole-route re-acquisition, where the bounded look-ahead of
//! the regular matcher has lost the traveller and every remaining segment is
//! a candidate.

use geo::Rect;
use rstar::primitives::{GeomWithData, Line};
use rstar::{RTree, AABB};

use crate::polyline::Polyline;

/// A route segment tagged with its index.
pub type IndexedSegment = GeomWithData<Line<[f64; 2]>, usize>;

/// Spatial index of the segments of one route.
pub struct SegmentIndex {
    tree: RTree<IndexedSegment>,
}

impl std::fmt::Debug for SegmentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentIndex")
            .field("segments", &self.tree.size())
            .finish()
    }
}

impl SegmentIndex {
    /// An index with no segments.
    pub fn empty() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-load every segment of `route`. Zero-length segments and segments
    /// touching a non-finite point are left out.
    pub fn build(route: &Polyline) -> Self {
        let segments: Vec<IndexedSegment> = route
            .segments()
            .filter(|(_, a, b)| a != b && a.is_finite() && b.is_finite())
            .map(|(i, a, b)| GeomWithData::new(Line::new([a.x, a.y], [b.x, b.y]), i))
            .collect();
        Self {
            tree: RTree::bulk_load(segments),
        }
    }

    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// Indices of segments at or after `from_segment` whose envelope
    /// intersects `region`, in route order.
    pub fn candidates(&self, region: &Rect<f64>, from_segment: usize) -> Vec<usize> {
        let min = region.min();
        let max = region.max();
        let envelope = AABB::from_corners([min.x, min.y], [max.x, max.y]);

        let mut indices: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|segment| segment.data)
            .filter(|&i| i >= from_segment)
            .collect();
        indices.sort_unstable();
        indices
    }
}
