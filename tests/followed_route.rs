//! End-to-end route following scenarios.
//!
//! Each test drives a `RouteTracker` the way a guidance layer would: build a
//! route, feed fixes, and query distances or the direction point.
//!
//! Run with: `cargo test --test followed_route`
//! Add `RUST_LOG=debug` and `-- --nocapture` to see match decisions.

use route_follower::geo_utils::distance_on_earth;
use route_follower::{predict_distance, Fix, MercatorPoint, Polyline, RouteTracker};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn pt(x: f64, y: f64) -> MercatorPoint {
    MercatorPoint::new(x, y)
}

fn fix(x: f64, y: f64, radius_m: f64) -> Fix {
    Fix::new(pt(x, y), radius_m)
}

/// Route used by most scenarios: two collinear segments along the equator.
fn directed_route() -> Polyline {
    Polyline::from_xy(&[(0.0, 0.0), (3.0, 0.0), (5.0, 0.0)])
}

fn assert_almost_equal(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {}, got {}",
        expected,
        actual
    );
}

// ============================================================================
// Geometry Mutation
// ============================================================================

#[test]
fn test_append_concatenates_points() {
    init_logging();
    let mut tracker = RouteTracker::new(directed_route());
    let tail = Polyline::from_xy(&[(6.0, 0.0), (7.0, 0.0)]);

    assert_eq!(tracker.route(), &directed_route());
    tracker.append(&tail);
    assert_eq!(tracker.route().len(), 5);

    let mut expected = directed_route();
    expected.append(&tail);
    assert_eq!(tracker.route(), &expected);
}

#[test]
fn test_pop_back_removes_one_point() {
    init_logging();
    let mut tracker = RouteTracker::new(directed_route());
    assert_eq!(tracker.route().len(), 3);

    tracker.pop_back();
    assert_eq!(tracker.route().len(), 2);
    assert_eq!(tracker.route().points(), &[pt(0.0, 0.0), pt(3.0, 0.0)]);
}

#[test]
fn test_initial_state() {
    init_logging();
    let tracker = RouteTracker::new(directed_route());
    assert!(tracker.is_valid());
    assert_eq!(tracker.current().segment_index, 0);
    assert_eq!(tracker.current().point, pt(0.0, 0.0));
    assert_eq!(tracker.route().len(), 3);
}

// ============================================================================
// Projection
// ============================================================================

#[test]
fn test_following_by_projection() {
    init_logging();
    let mut tracker = RouteTracker::new(directed_route());
    assert_eq!(tracker.current().segment_index, 0);

    tracker.update_projection(&fix(0.0, 0.0, 2.0));
    assert_eq!(tracker.current().segment_index, 0);
    assert_eq!(tracker.current().point, pt(0.0, 0.0));

    tracker.update_projection(&fix(1.0, 0.0, 2.0));
    assert_eq!(tracker.current().segment_index, 0);
    assert_eq!(tracker.current().point, pt(1.0, 0.0));

    tracker.update_projection(&fix(4.0, 0.0, 2.0));
    assert_eq!(tracker.current().segment_index, 1);
    assert_eq!(tracker.current().point, pt(4.0, 0.0));

    let miss = tracker.update_projection(&fix(5.0001, 0.0, 1.0));
    assert!(miss.is_none());
    assert_eq!(tracker.current().segment_index, 1);
    assert_eq!(tracker.current().point, pt(4.0, 0.0));

    let clamped = tracker.update_projection(&fix(5.0001, 0.0, 2000.0));
    assert!(clamped.is_some());
    assert_eq!(tracker.current().segment_index, 1);
    assert_eq!(tracker.current().point, pt(5.0, 0.0));
}

#[test]
fn test_following_by_prediction() {
    init_logging();
    let route = Polyline::from_xy(&[(0.0, 0.0), (0.003, 0.0), (0.003, 1.0)]);
    let mut tracker = RouteTracker::new(route);
    assert_eq!(tracker.current().segment_index, 0);

    tracker.update_projection(&fix(0.0, 0.0, 2.0));
    assert_eq!(tracker.current().segment_index, 0);
    assert_eq!(tracker.current().point, pt(0.0, 0.0));

    // Near the equator a degree of longitude and of latitude are about equal.
    let predicted = distance_on_earth(pt(0.0, 0.0), pt(0.003, 0.0)) * 2.0;
    tracker.update_projection_by_prediction(&fix(0.002, 0.003, 20_000.0), predicted);
    assert_eq!(tracker.current().segment_index, 1);
    assert!(distance_on_earth(tracker.current().point, pt(0.003, 0.003)) <= 0.1);
}

#[test]
fn test_prediction_from_consecutive_fixes() {
    init_logging();
    let route = Polyline::from_xy(&[(0.0, 0.0), (0.003, 0.0), (0.003, 1.0)]);
    let mut tracker = RouteTracker::new(route);

    let previous = pt(0.0, 0.0);
    let next = pt(0.003, 0.0);
    tracker.update_projection(&Fix::new(previous, 2.0));

    let matched = tracker
        .update_projection_by_prediction(&fix(0.002, 0.003, 20_000.0), predict_distance(previous, next))
        .unwrap();
    assert_eq!(matched.segment_index, 1);
}

// ============================================================================
// Distances
// ============================================================================

#[test]
fn test_distance_calculation() {
    init_logging();
    // Full length
    let mut tracker = RouteTracker::new(directed_route());
    let route = directed_route();
    let front = route.front().unwrap();
    let back = route.back().unwrap();

    let distance = tracker.distance_m(&tracker.begin().unwrap(), &tracker.end().unwrap());
    let master = distance_on_earth(front, back);
    assert_almost_equal(distance, master);
    assert_almost_equal(tracker.total_distance_m(), master);

    // Partial length
    tracker.update_projection(&fix(3.0, 0.0, 2.0));
    let distance = tracker.distance_m(&tracker.current(), &tracker.end().unwrap());
    let master = distance_on_earth(route.point(1).unwrap(), back);
    assert_almost_equal(distance, master);
    assert_almost_equal(tracker.distance_to_end_m(), master);

    // Point in the middle of a segment
    tracker.update_projection(&fix(4.0, 0.0, 2.0));
    let distance = tracker.distance_m(&tracker.current(), &tracker.end().unwrap());
    let master = distance_on_earth(pt(4.0, 0.0), back);
    assert_almost_equal(distance, master);
    assert_almost_equal(tracker.distance_to_end_m(), master);
}

#[test]
fn test_distance_from_begin() {
    init_logging();
    let route = Polyline::from_xy(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (5.0, 0.0), (6.0, 0.0)]);
    let mut tracker = RouteTracker::new(route);

    tracker.update_projection(&fix(4.0, 0.0, 2.0));
    let master = distance_on_earth(pt(0.0, 0.0), pt(4.0, 0.0));
    assert_almost_equal(tracker.distance_from_begin_m(), master);
}

#[test]
fn test_distance_is_additive_along_route() {
    init_logging();
    let route = Polyline::from_xy(&[(0.0, 0.0), (0.001, 0.0), (0.001, 0.001), (0.002, 0.001), (0.002, 0.003)]);
    let mut tracker = RouteTracker::new(route);
    let begin = tracker.begin().unwrap();
    let end = tracker.end().unwrap();
    let total = tracker.total_distance_m();
    assert_almost_equal(tracker.distance_m(&begin, &end), total);

    for (x, y) in [(0.0005, 0.0), (0.001, 0.0004), (0.0015, 0.001), (0.002, 0.0025)] {
        let matched = tracker.update_projection(&fix(x, y, 5.0)).expect("fix on route");
        let split = tracker.distance_m(&begin, &matched) + tracker.distance_m(&matched, &end);
        assert_almost_equal(split, total);
        assert_almost_equal(tracker.distance_from_begin_m() + tracker.distance_to_end_m(), total);
    }
}

#[test]
fn test_duplicate_points_collapse_silently() {
    init_logging();
    let route = Polyline::from_xy(&[(0.0, 0.0), (0.001, 0.0), (0.001, 0.0), (0.001, 0.001), (0.002, 0.001)]);
    let mut tracker = RouteTracker::new(route);
    let begin = tracker.begin().unwrap();
    let end = tracker.end().unwrap();

    let total = distance_on_earth(pt(0.0, 0.0), pt(0.001, 0.0))
        + distance_on_earth(pt(0.001, 0.0), pt(0.001, 0.001))
        + distance_on_earth(pt(0.001, 0.001), pt(0.002, 0.001));
    assert_almost_equal(tracker.total_distance_m(), total);
    assert_almost_equal(tracker.distance_m(&begin, &end), total);

    for (x, y) in [(0.0005, 0.0), (0.001, 0.0005), (0.0015, 0.001)] {
        let matched = tracker.update_projection(&fix(x, y, 5.0)).expect("fix on route");
        let split = tracker.distance_m(&begin, &matched) + tracker.distance_m(&matched, &end);
        assert_almost_equal(split, total);
    }
}

#[test]
fn test_prediction_starting_on_duplicate_point() {
    init_logging();
    let route = Polyline::from_xy(&[(0.0, 0.0), (0.001, 0.0), (0.001, 0.0), (0.001, 0.001), (0.002, 0.001)]);
    let mut tracker = RouteTracker::new(route);
    let on_duplicate = tracker.iter_to_index(1).unwrap();
    tracker.restore(on_duplicate).unwrap();
    assert_eq!(tracker.current().segment_index, 1);

    let predicted = distance_on_earth(pt(0.001, 0.0), pt(0.001, 0.0005));
    let matched = tracker
        .update_projection_by_prediction(&fix(0.001, 0.0005, 5.0), predicted)
        .unwrap();
    assert_eq!(matched.segment_index, 2);
    assert_almost_equal(
        tracker.distance_from_begin_m(),
        distance_on_earth(pt(0.0, 0.0), pt(0.001, 0.0)) + predicted,
    );
}

// ============================================================================
// Direction
// ============================================================================

#[test]
fn test_direction_point() {
    init_logging();
    let route = Polyline::from_xy(&[(0.0, 0.0), (1.00003, 0.0), (1.00003, 1.0)]);
    let mut tracker = RouteTracker::new(route.clone());
    assert_eq!(tracker.current().segment_index, 0);

    assert_eq!(tracker.current_direction_point(20.0), route.point(1));

    tracker.update_projection(&fix(1.0, 0.0, 2.0));
    assert_eq!(tracker.current().segment_index, 0);
    assert_eq!(tracker.current_direction_point(0.0001), route.point(1));
    assert_eq!(tracker.current_direction_point(20.0), route.point(2));
}

#[test]
fn test_direction_point_at_route_end() {
    init_logging();
    let mut tracker = RouteTracker::new(directed_route());
    tracker.update_projection(&fix(4.9, 0.0, 2.0));
    assert_eq!(tracker.current_direction_point(1e9), Some(pt(5.0, 0.0)));
}
