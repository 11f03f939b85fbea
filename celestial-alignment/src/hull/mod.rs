//! Incremental 3D convex hull of sync-point directions.
//!
//! With four or more sync points the sky is cut into triangles whose corners are
//! the sync points themselves; each triangle later gets its own local transform.
//! Those triangles are the faces of the convex hull of the unit vectors.
//!
//! The construction is the classic incremental algorithm: start from a
//! two-sided triangle, then add one point at a time, removing the faces it can
//! see and stitching a cone of new faces from the horizon of that region to the
//! point. Points that see no face are inside the current hull and are dropped.
//!
//! The visibility predicate is the sign of a tetrahedron volume. It is evaluated
//! on integer copies of the coordinates (scaled by `scale_factor` and rounded)
//! so the sign is exact and consistent across the whole construction.
//!
//! Faces are reported with the caller's original point indices, wound
//! counter-clockwise when viewed from outside.

mod arena;
mod build;
mod validate;

use crate::error::Result;
use crate::vector::DirectionVector;
use arena::Arena;
use build::Builder;
use tracing::debug;

/// Default fixed-point quantisation factor.
pub const DEFAULT_SCALE_FACTOR: f64 = 1e6;

/// One triangular hull face, as indices into the input point slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HullFace {
    pub vertices: [usize; 3],
}

impl HullFace {
    pub fn contains(&self, index: usize) -> bool {
        self.vertices.contains(&index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HullStats {
    pub vertices: usize,
    pub edges: usize,
    pub faces: usize,
}

#[derive(Debug, Clone)]
pub struct ConvexHull {
    arena: Arena,
    faces: Vec<HullFace>,
}

impl ConvexHull {
    /// Builds the hull of `points`.
    ///
    /// Fails if there are fewer than four points or if they are all collinear
    /// or all coplanar after quantisation.
    pub fn build(points: &[DirectionVector], scale_factor: f64) -> Result<Self> {
        let arena = Builder::new(points, scale_factor).build()?;
        let faces = arena
            .live_faces()
            .into_iter()
            .map(|f| HullFace {
                vertices: arena.face(f).vertices.map(|v| arena.vertex(v).index),
            })
            .collect();
        let hull = Self { arena, faces };
        let stats = hull.stats();
        debug!(
            points = points.len(),
            vertices = stats.vertices,
            edges = stats.edges,
            faces = stats.faces,
            "convex hull built"
        );
        Ok(hull)
    }

    pub fn faces(&self) -> &[HullFace] {
        &self.faces
    }

    /// Original indices of the points that ended up on the hull, ascending.
    pub fn vertex_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .arena
            .live_vertices()
            .into_iter()
            .map(|v| self.arena.vertex(v).index)
            .collect();
        indices.sort_unstable();
        indices
    }

    pub fn stats(&self) -> HullStats {
        HullStats {
            vertices: self.arena.live_vertices().len(),
            edges: self.arena.live_edges().len(),
            faces: self.arena.live_faces().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64, z: f64) -> DirectionVector {
        DirectionVector::new(x, y, z)
    }

    fn assert_valid(hull: &ConvexHull) {
        hull.check_euler().unwrap();
        hull.check_consistency().unwrap();
        hull.check_convexity().unwrap();
    }

    fn assert_outward(hull: &ConvexHull, points: &[DirectionVector], interior: DirectionVector) {
        for face in hull.faces() {
            let [a, b, c] = face.vertices.map(|i| points[i]);
            let normal = (b - a).cross(&(c - a));
            assert!(normal.dot(&(a - interior)) > 0.0, "face {:?} wound inward", face);
        }
    }

    #[test]
    fn tetrahedron() {
        let pts = [v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0), v(0.0, 0.0, 1.0)];
        let hull = ConvexHull::build(&pts, DEFAULT_SCALE_FACTOR).unwrap();
        assert_eq!(hull.stats(), HullStats { vertices: 4, edges: 6, faces: 4 });
        assert_eq!(hull.vertex_indices(), vec![0, 1, 2, 3]);
        assert_valid(&hull);
        assert_outward(&hull, &pts, v(0.1, 0.1, 0.1));
    }

    #[test]
    fn octahedron() {
        let pts = [
            v(1.0, 0.0, 0.0),
            v(-1.0, 0.0, 0.0),
            v(0.0, 1.0, 0.0),
            v(0.0, -1.0, 0.0),
            v(0.0, 0.0, 1.0),
            v(0.0, 0.0, -1.0),
        ];
        let hull = ConvexHull::build(&pts, DEFAULT_SCALE_FACTOR).unwrap();
        assert_eq!(hull.stats(), HullStats { vertices: 6, edges: 12, faces: 8 });
        assert_valid(&hull);
        assert_outward(&hull, &pts, v(0.0, 0.0, 0.0));
    }

    #[test]
    fn interior_point_is_discarded() {
        let mut pts: Vec<DirectionVector> = Vec::new();
        for &x in &[-1.0, 1.0] {
            for &y in &[-1.0, 1.0] {
                for &z in &[-1.0, 1.0] {
                    pts.push(v(x, y, z));
                }
            }
        }
        pts.insert(3, v(0.1, -0.2, 0.3));
        let hull = ConvexHull::build(&pts, DEFAULT_SCALE_FACTOR).unwrap();
        assert!(!hull.vertex_indices().contains(&3));
        assert_eq!(hull.stats().vertices, 8);
        assert!(hull.faces().iter().all(|f| !f.contains(3)));
        assert_valid(&hull);
    }

    #[test]
    fn duplicate_point_is_discarded() {
        let pts = [
            v(1.0, 0.0, 0.0),
            v(0.0, 1.0, 0.0),
            v(-1.0, 0.0, 0.0),
            v(0.0, 0.0, 1.0),
            v(0.0, 1.0, 0.0),
            v(0.0, 0.0, -1.0),
        ];
        let hull = ConvexHull::build(&pts, DEFAULT_SCALE_FACTOR).unwrap();
        assert_eq!(hull.stats().vertices, 5);
        assert_valid(&hull);
    }

    #[test]
    fn sky_points_with_nadir() {
        let mut pts = vec![DirectionVector::nadir()];
        for (alt, az) in [(30.0, 10.0), (45.0, 80.0), (60.0, 170.0), (35.0, 250.0), (50.0, 320.0)] {
            pts.push(DirectionVector::from_altitude_azimuth(alt, az));
        }
        let hull = ConvexHull::build(&pts, DEFAULT_SCALE_FACTOR).unwrap();
        let s = hull.stats();
        assert_eq!(s.vertices, 6);
        assert_eq!(s.faces, 2 * s.vertices - 4);
        assert_eq!(2 * s.edges, 3 * s.faces);
        assert_valid(&hull);
        assert_outward(&hull, &pts, v(0.0, 0.0, 0.0));
        assert!(hull.faces().iter().any(|f| f.contains(0)));
    }

    #[test]
    fn many_points_on_sphere() {
        let mut pts = vec![DirectionVector::nadir()];
        for i in 0..40 {
            let alt = -60.0 + (i as f64) * 3.7;
            let az = (i as f64) * 137.508;
            pts.push(DirectionVector::from_altitude_azimuth(alt, az));
        }
        let hull = ConvexHull::build(&pts, DEFAULT_SCALE_FACTOR).unwrap();
        assert_eq!(hull.stats().vertices, pts.len());
        assert_valid(&hull);
    }

    #[test]
    fn face_edge_handles_match_corners() {
        let pts = [v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0), v(0.0, 0.0, 1.0)];
        let mut hull = ConvexHull::build(&pts, DEFAULT_SCALE_FACTOR).unwrap();
        hull.check_consistency().unwrap();

        let f = hull.arena.live_faces()[0];
        hull.arena.face_mut(f).edges.swap(0, 1);
        assert!(hull.check_consistency().is_err());
    }

    #[test]
    fn collinear_input_fails() {
        let pts = [v(0.0, 0.0, 0.0), v(1.0, 1.0, 1.0), v(2.0, 2.0, 2.0), v(3.0, 3.0, 3.0)];
        assert!(ConvexHull::build(&pts, DEFAULT_SCALE_FACTOR).is_err());
    }

    #[test]
    fn coplanar_input_fails() {
        let pts = [v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0), v(-1.0, 0.0, 0.0), v(0.0, -1.0, 0.0)];
        assert!(ConvexHull::build(&pts, DEFAULT_SCALE_FACTOR).is_err());
    }
}
