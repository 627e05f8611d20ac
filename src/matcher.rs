//! Projection matching of position fixes onto a route.
//!
//! Two strategies share one scan:
//! - **Plain projection**: prefer the furthest-forward segment whose
//!   projection of the fix center lands inside the uncertainty region.
//! - **Prediction-biased projection**: walk the predicted travel distance
//!   forward from the current position, then prefer the candidate whose
//!   along-route distance from the current position best matches that
//!   prediction.
//!
//! Both scan a bounded window of segments ahead of the current position,
//! first the near window, then the extended look-ahead. Nothing behind the
//! current segment is ever considered, and a candidate behind the current
//! point on its own segment holds the match where it is.

use std::ops::Range;

use geo::Rect;
use log::trace;

use crate::distance::{distance_between, SegmentDistances};
use crate::geo_utils::{distance_on_earth, interpolate, project_to_segment, rect_contains};
use crate::polyline::Polyline;
use crate::position::PositionRef;
use crate::{MercatorPoint, TrackerConfig};

/// Margin applied to the distance between consecutive fixes when it is used
/// as a travel prediction.
pub const PREDICTION_SAFETY_FACTOR: f64 = 2.0;

/// Predicted travel distance derived from two consecutive fix centers.
pub fn predict_distance(previous: MercatorPoint, next: MercatorPoint) -> f64 {
    distance_on_earth(previous, next) * PREDICTION_SAFETY_FACTOR
}

/// Predicted travel distance derived from elapsed time and estimated speed.
pub fn predict_distance_from_speed(elapsed_s: f64, speed_mps: f64) -> f64 {
    (elapsed_s * speed_mps).max(0.0)
}

/// Project the center of `region` onto segment `segment_index` and keep the
/// result only if it lies inside the region.
pub fn admissible_projection(
    route: &Polyline,
    region: &Rect<f64>,
    segment_index: usize,
) -> Option<PositionRef> {
    let (a, b) = route.segment(segment_index)?;
    let center = MercatorPoint::from(region.center());
    let projection = project_to_segment(center, a, b)?;
    rect_contains(region, projection.point).then(|| PositionRef::new(segment_index, projection.point))
}

/// Keep matches from moving backward: a candidate on the current segment
/// that lies behind `current` is replaced by `current` itself.
pub fn hold_forward(route: &Polyline, current: &PositionRef, candidate: PositionRef) -> PositionRef {
    if candidate.segment_index != current.segment_index {
        return candidate;
    }
    let Some((a, b)) = route.segment(current.segment_index) else {
        return candidate;
    };
    let along = |p: MercatorPoint| (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y);
    if along(candidate.point) < along(current.point) {
        *current
    } else {
        candidate
    }
}

/// Read-only matching view over a route and its prefix sums.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionMatcher<'a> {
    route: &'a Polyline,
    distances: &'a SegmentDistances,
    config: &'a TrackerConfig,
}

impl<'a> ProjectionMatcher<'a> {
    pub fn new(
        route: &'a Polyline,
        distances: &'a SegmentDistances,
        config: &'a TrackerConfig,
    ) -> Self {
        Self {
            route,
            distances,
            config,
        }
    }

    /// All admissible projections of the region center onto the segments in
    /// `segments`, in route order. Zero-length segments are skipped.
    pub fn admissible_projections<'r>(
        &self,
        region: &'r Rect<f64>,
        segments: Range<usize>,
    ) -> impl Iterator<Item = PositionRef> + 'r
    where
        'a: 'r,
    {
        let route: &'r Polyline = self.route;
        let end = segments.end.min(route.segment_count());
        (segments.start..end).filter_map(move |i| admissible_projection(route, region, i))
    }

    /// Near and extended scan windows starting at `start` and anchored at
    /// `anchor` (the current or predicted segment).
    fn windows(&self, start: usize, anchor: usize) -> [Range<usize>; 2] {
        let segment_count = self.route.segment_count();
        let near_end = anchor
            .saturating_add(self.config.near_window_segments)
            .min(segment_count)
            .max(start);
        let far_end = anchor
            .saturating_add(self.config.lookahead_segments)
            .min(segment_count)
            .max(near_end);
        [start..near_end, near_end..far_end]
    }

    /// Plain projection: the furthest-forward admissible candidate within the
    /// first window that has any. A candidate behind `current` on its own
    /// segment holds the match at `current`.
    ///
    /// `current` must lie on an existing segment of the route. Returns `None`
    /// when no segment in the look-ahead yields a contained projection.
    pub fn update_projection(&self, current: &PositionRef, region: &Rect<f64>) -> Option<PositionRef> {
        for window in self.windows(current.segment_index, current.segment_index) {
            trace!("[RouteTracker] plain scan of segments {:?}", window);
            // One projection per segment, so the largest index is unique.
            let best = self
                .admissible_projections(region, window)
                .map(|candidate| hold_forward(self.route, current, candidate))
                .max_by_key(|candidate| candidate.segment_index);
            if best.is_some() {
                return best;
            }
        }
        None
    }

    /// Walk `distance_m` forward along the route from `current`.
    ///
    /// Clamps to the end sentinel when the walk runs past the last point.
    pub fn predict_position(&self, current: &PositionRef, distance_m: f64) -> Option<PositionRef> {
        let mut remaining = distance_m.max(0.0);
        let mut segment_index = current.segment_index;
        let mut from = current.point;

        while let Some((_, b)) = self.route.segment(segment_index) {
            let left = distance_on_earth(from, b);
            if remaining <= left {
                let t = if left > 0.0 { remaining / left } else { 0.0 };
                return Some(PositionRef::new(segment_index, interpolate(from, b, t)));
            }
            remaining -= left;
            segment_index += 1;
            from = b;
        }

        PositionRef::end(self.route)
    }

    /// Prediction-biased projection.
    ///
    /// The scan starts at most `near_window_segments` before the predicted
    /// segment (never before the current one), so its cost does not grow with
    /// the prediction. Non-positive or non-finite predictions fall back to
    /// [`update_projection`](Self::update_projection).
    pub fn update_projection_by_prediction(
        &self,
        current: &PositionRef,
        region: &Rect<f64>,
        predicted_distance_m: f64,
    ) -> Option<PositionRef> {
        if !predicted_distance_m.is_finite() || predicted_distance_m <= 0.0 {
            return self.update_projection(current, region);
        }

        let predicted = self.predict_position(current, predicted_distance_m)?;
        trace!(
            "[RouteTracker] predicted segment {} after {:.1}m",
            predicted.segment_index,
            predicted_distance_m
        );

        let start = predicted
            .segment_index
            .saturating_sub(self.config.near_window_segments)
            .max(current.segment_index);
        for window in self.windows(start, predicted.segment_index) {
            trace!("[RouteTracker] predicted scan of segments {:?}", window);
            let best = self
                .admissible_projections(region, window)
                .map(|candidate| {
                    let candidate = hold_forward(self.route, current, candidate);
                    let travelled = distance_between(self.route, self.distances, current, &candidate);
                    ((travelled - predicted_distance_m).abs(), candidate)
                })
                .min_by(|(score_a, a), (score_b, b)| {
                    score_a
                        .total_cmp(score_b)
                        .then(b.segment_index.cmp(&a.segment_index))
                })
                .map(|(_, candidate)| candidate);
            if best.is_some() {
                return best;
            }
        }
        None
    }
}
