//! Geographic utilities shared by the matcher and the distance accumulator.
//!
//! Route geometry lives in spherical Mercator degrees: `x` is longitude and
//! `y` is the projected latitude. Real-world distances are always measured by
//! converting back to WGS84 and taking the haversine distance.

use geo::{Coord, Distance, Haversine, Point, Rect};

use crate::{GpsPoint, MercatorPoint};

/// Latitudes beyond this are clamped before projecting.
pub const MAX_PROJECTED_LATITUDE: f64 = 86.0;

/// Mercator `y` range (degrees), mirroring the longitude range.
pub const MIN_Y: f64 = -180.0;
pub const MAX_Y: f64 = 180.0;

/// Degrees of latitude per meter along a meridian.
pub const DEGREES_PER_METER: f64 = 360.0 / 40_008_245.0;

/// Project a latitude (degrees) to Mercator `y` (degrees).
pub fn lat_to_y(lat: f64) -> f64 {
    let lat = lat.clamp(-MAX_PROJECTED_LATITUDE, MAX_PROJECTED_LATITUDE);
    let sin_lat = lat.to_radians().sin();
    let y = (0.5 * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln()).to_degrees();
    y.clamp(MIN_Y, MAX_Y)
}

/// Inverse of [`lat_to_y`].
pub fn y_to_lat(y: f64) -> f64 {
    y.to_radians().sinh().atan().to_degrees()
}

/// Haversine distance in meters between two Mercator points.
pub fn distance_on_earth(a: MercatorPoint, b: MercatorPoint) -> f64 {
    let a = a.to_gps();
    let b = b.to_gps();
    haversine_distance(&a, &b)
}

/// Haversine distance in meters between two GPS points.
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Build the rectangle of plausible positions around `center`.
///
/// `radius_m` is the half-extent along each axis, in meters. The longitude
/// offset is widened by the cosine of the latitude farthest from the equator
/// so the rectangle never under-covers the requested radius.
pub fn rect_by_center_and_radius_m(center: MercatorPoint, radius_m: f64) -> Rect<f64> {
    let gps = center.to_gps();

    let lat_offset = radius_m * DEGREES_PER_METER;
    let min_lat = (gps.latitude - lat_offset).max(-90.0);
    let max_lat = (gps.latitude + lat_offset).min(90.0);

    let cos_lat = min_lat
        .abs()
        .max(max_lat.abs())
        .to_radians()
        .cos()
        .max(0.00001);
    let lon_offset = radius_m * DEGREES_PER_METER / cos_lat;
    let min_lon = (gps.longitude - lon_offset).max(-180.0);
    let max_lon = (gps.longitude + lon_offset).min(180.0);

    Rect::new(
        Coord {
            x: min_lon,
            y: lat_to_y(min_lat),
        },
        Coord {
            x: max_lon,
            y: lat_to_y(max_lat),
        },
    )
}

/// Closed containment: points on the boundary count as inside.
pub fn rect_contains(rect: &Rect<f64>, point: MercatorPoint) -> bool {
    let min = rect.min();
    let max = rect.max();
    point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
}

/// Projection of a point onto a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Projected point on the closed segment
    pub point: MercatorPoint,
    /// Interpolation parameter in `[0, 1]`
    pub t: f64,
}

/// Project `p` onto the closed segment `[a, b]`.
///
/// Returns `None` for zero-length segments. The endpoints are returned
/// exactly when the projection is clamped.
pub fn project_to_segment(
    p: MercatorPoint,
    a: MercatorPoint,
    b: MercatorPoint,
) -> Option<SegmentProjection> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return None;
    }

    let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq;
    let projection = if t <= 0.0 {
        SegmentProjection { point: a, t: 0.0 }
    } else if t >= 1.0 {
        SegmentProjection { point: b, t: 1.0 }
    } else {
        SegmentProjection {
            point: MercatorPoint::new(a.x + dx * t, a.y + dy * t),
            t,
        }
    };
    Some(projection)
}

/// Point at interpolation parameter `t` along `[a, b]`.
pub fn interpolate(a: MercatorPoint, b: MercatorPoint, t: f64) -> MercatorPoint {
    if t <= 0.0 {
        return a;
    }
    if t >= 1.0 {
        return b;
    }
    MercatorPoint::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Check whether `p` lies on the closed segment `[a, b]` within `epsilon`
/// (Mercator degrees).
pub fn is_on_segment(p: MercatorPoint, a: MercatorPoint, b: MercatorPoint, epsilon: f64) -> bool {
    let projected = match project_to_segment(p, a, b) {
        Some(proj) => proj.point,
        None => a,
    };
    (projected.x - p.x).abs() <= epsilon && (projected.y - p.y).abs() <= epsilon
}
