//! 2D geometry helpers.
//!
//! Positions are [`nalgebra`] vectors in model units. Hit-testing shapes for
//! probes and branch bodies are [`geo`] polygons, which provide the
//! intersection and containment tests the topology graph relies on.

use geo::{Centroid, Coord, LineString, Polygon};

/// Position or displacement in model coordinates.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Number of edges used to approximate a circle.
const CIRCLE_SEGMENTS: usize = 16;

/// Shorthand constructor.
pub fn vec2(x: f64, y: f64) -> Vector2 {
    Vector2::new(x, y)
}

/// Convert a model vector into a geo coordinate.
pub fn to_coord(v: Vector2) -> Coord<f64> {
    Coord { x: v.x, y: v.y }
}

/// Regular polygon approximating a circle.
pub fn circle(center: Vector2, radius: f64) -> Polygon<f64> {
    let points: Vec<Coord<f64>> = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::TAU / CIRCLE_SEGMENTS as f64;
            to_coord(center + Vector2::new(angle.cos(), angle.sin()) * radius)
        })
        .collect();
    Polygon::new(LineString::from(points), vec![])
}

/// Axis-aligned square centered on a point.
pub fn square(center: Vector2, half_size: f64) -> Polygon<f64> {
    rectangle(
        center - Vector2::new(half_size, half_size),
        center + Vector2::new(half_size, half_size),
    )
}

/// Axis-aligned rectangle from two corners.
pub fn rectangle(min: Vector2, max: Vector2) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            (min.x, min.y),
            (max.x, min.y),
            (max.x, max.y),
            (min.x, max.y),
        ]),
        vec![],
    )
}

/// Oriented rectangle covering the segment `a`-`b` with the given half width.
///
/// Degenerate segments produce a square around `a`.
pub fn segment_body(a: Vector2, b: Vector2, half_width: f64) -> Polygon<f64> {
    let axis = b - a;
    let length = axis.norm();
    if length < crate::EPSILON {
        return square(a, half_width);
    }
    let normal = Vector2::new(-axis.y, axis.x) / length * half_width;
    Polygon::new(
        LineString::from(vec![
            to_coord(a + normal),
            to_coord(b + normal),
            to_coord(b - normal),
            to_coord(a - normal),
        ]),
        vec![],
    )
}

/// Fraction along `a`-`b` of the orthogonal projection of `p`, clamped to [0, 1].
pub fn project_fraction(p: Vector2, a: Vector2, b: Vector2) -> f64 {
    let axis = b - a;
    let length_sq = axis.norm_squared();
    if length_sq < crate::EPSILON * crate::EPSILON {
        return 0.0;
    }
    ((p - a).dot(&axis) / length_sq).clamp(0.0, 1.0)
}

/// Centroid of a shape, if it has any area or extent.
pub fn centroid(shape: &Polygon<f64>) -> Option<Vector2> {
    shape.centroid().map(|p| Vector2::new(p.x(), p.y()))
}

/// Unit vector from `from` toward `to`, falling back to +x when they coincide.
pub fn direction(from: Vector2, to: Vector2) -> Vector2 {
    let delta = to - from;
    let length = delta.norm();
    if length < crate::EPSILON {
        Vector2::x()
    } else {
        delta / length
    }
}
