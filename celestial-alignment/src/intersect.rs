//! Ray/triangle intersection for locating the sky facet a direction falls in.
//!
//! The ray always starts at the origin (the observer) and points along the query
//! direction. The test is the Möller–Trumbore closed form: it solves for the
//! barycentric coordinates `(u, v)` of the crossing point and the ray parameter
//! `t` without building the triangle's plane equation.

use crate::vector::DirectionVector;

/// Default threshold for near-parallel rays and for the forward-distance check.
pub const DEFAULT_EPSILON: f64 = 1e-12;

/// Returns `true` if the ray from the origin along `ray` crosses the triangle
/// `(v0, v1, v2)` in front of the origin.
///
/// Both windings count: a ray crossing the triangle from its back side is a
/// hit. Rays lying (nearly) in the triangle's plane are reported as misses.
pub fn ray_intersects_triangle(
    ray: &DirectionVector,
    v0: &DirectionVector,
    v1: &DirectionVector,
    v2: &DirectionVector,
    epsilon: f64,
) -> bool {
    let edge1 = v1.minus(v0);
    let edge2 = v2.minus(v0);

    let p = ray.cross(&edge2);
    let det = edge1.dot(&p);
    if det.abs() < epsilon {
        return false;
    }
    let inv_det = 1.0 / det;

    // Origin minus v0.
    let s = -*v0;
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = s.cross(&edge1);
    let v = ray.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    let t = edge2.dot(&q) * inv_det;
    t > epsilon
}
