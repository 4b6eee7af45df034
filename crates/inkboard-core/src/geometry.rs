//! Distance primitives used by hit-testing.

use kurbo::{Point, Vec2};

/// Distance from `point` to the segment `a`→`b`.
///
/// The projection is clamped to the segment, so points beyond either end
/// measure to the nearest endpoint. A degenerate segment (`a == b`) is
/// treated as a single point.
pub fn distance_point_to_segment(point: Point, a: Point, b: Point) -> f64 {
    let seg: Vec2 = b - a;
    let pv: Vec2 = point - a;
    let len_sq = seg.hypot2();
    if len_sq == 0.0 {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let closest = a + seg * t;
    (point - closest).hypot()
}

/// Minimum distance from `point` to a polyline of connected segments.
///
/// Returns `f64::INFINITY` when fewer than two points are given.
pub fn distance_point_to_polyline(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| distance_point_to_segment(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}
