//! Shared 2D geometry helpers for hit-testing.

use kurbo::{Point, Vec2};

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    ((point.x - proj.x).powi(2) + (point.y - proj.y).powi(2)).sqrt()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Check if a point lies inside the triangle (a, b, c).
pub fn point_in_triangle(point: Point, a: Point, b: Point, c: Point) -> bool {
    fn sign(p1: Point, p2: Point, p3: Point) -> f64 {
        (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
    }

    let d1 = sign(point, a, b);
    let d2 = sign(point, b, c);
    let d3 = sign(point, c, a);

    let has_neg = (d1 < 0.0) || (d2 < 0.0) || (d3 < 0.0);
    let has_pos = (d1 > 0.0) || (d2 > 0.0) || (d3 > 0.0);

    !(has_neg && has_pos)
}

/// Compute the three corners of an arrow head: the tip plus the two
/// barbs behind it. `dir` is the travel direction of the line at the tip
/// and need not be normalized.
pub fn arrow_head(tip: Point, dir: Vec2, size: f64) -> [Point; 3] {
    let len = dir.hypot();
    let dir = if len < f64::EPSILON {
        Vec2::new(1.0, 0.0)
    } else {
        dir / len
    };
    let perp = Vec2::new(-dir.y, dir.x);

    let back = Point::new(tip.x - dir.x * size, tip.y - dir.y * size);
    let left = Point::new(back.x + perp.x * size * 0.5, back.y + perp.y * size * 0.5);
    let right = Point::new(back.x - perp.x * size * 0.5, back.y - perp.y * size * 0.5);

    [tip, left, right]
}

/// Clamp a point to non-negative canvas coordinates.
pub fn clamp_to_canvas(point: Point) -> Point {
    Point::new(point.x.max(0.0), point.y.max(0.0))
}
