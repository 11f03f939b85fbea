use super::build::volume_sign;
use super::ConvexHull;
use crate::error::{Error, Result};

impl ConvexHull {
    /// Checks Euler's formula `V - E + F = 2` and the triangulated-surface
    /// identities `F = 2V - 4` and `2E = 3F`.
    pub fn check_euler(&self) -> Result<()> {
        let s = self.stats();
        let (v, e, f) = (s.vertices as i64, s.edges as i64, s.faces as i64);
        if v - e + f != 2 {
            return Err(Error::Hull(format!("V - E + F = {} - {} + {} != 2", v, e, f)));
        }
        if f != 2 * v - 4 {
            return Err(Error::Hull(format!("F = {} but 2V - 4 = {}", f, 2 * v - 4)));
        }
        if 2 * e != 3 * f {
            return Err(Error::Hull(format!("2E = {} but 3F = {}", 2 * e, 3 * f)));
        }
        Ok(())
    }

    /// Checks that every edge borders exactly two live faces, that both faces
    /// contain the edge's endpoints, and that the faces traverse the edge in
    /// opposite directions. Also checks each face's edge handles against its
    /// corners.
    pub fn check_consistency(&self) -> Result<()> {
        let arena = &self.arena;
        for e in arena.live_edges() {
            let edge = arena.edge(e);
            let [a, b] = edge.endpoints;
            let mut forward = 0;
            for slot in edge.faces {
                let f = slot.ok_or_else(|| Error::Hull(format!("edge {} has a missing face", e.0)))?;
                let face = arena.face(f);
                if !face.alive {
                    return Err(Error::Hull(format!("edge {} borders dead face {}", e.0, f.0)));
                }
                let i = face
                    .vertices
                    .iter()
                    .position(|&v| v == a)
                    .ok_or_else(|| Error::Hull(format!("face {} misses edge {} endpoint", f.0, e.0)))?;
                let next = face.vertices[(i + 1) % 3];
                let prev = face.vertices[(i + 2) % 3];
                if next == b {
                    forward += 1;
                } else if prev != b {
                    return Err(Error::Hull(format!("face {} misses edge {} endpoint", f.0, e.0)));
                }
            }
            if forward != 1 {
                return Err(Error::Hull(format!(
                    "faces of edge {} are not oppositely oriented",
                    e.0
                )));
            }
        }

        for f in arena.live_faces() {
            let face = arena.face(f);
            for (i, &e) in face.edges.iter().enumerate() {
                let edge = arena.edge(e);
                let (a, b) = (face.vertices[i], face.vertices[(i + 1) % 3]);
                let joins = edge.endpoints == [a, b] || edge.endpoints == [b, a];
                if !edge.alive || !joins {
                    return Err(Error::Hull(format!(
                        "face {} side {} is not backed by edge {}",
                        f.0, i, e.0
                    )));
                }
            }
        }
        Ok(())
    }

    /// Checks that no live hull vertex lies on the outer side of any face.
    pub fn check_convexity(&self) -> Result<()> {
        let arena = &self.arena;
        let vertices = arena.live_vertices();
        for f in arena.live_faces() {
            for &v in &vertices {
                if volume_sign(arena, f, v) < 0 {
                    return Err(Error::Hull(format!(
                        "vertex {} lies outside face {}",
                        arena.vertex(v).index,
                        f.0
                    )));
                }
            }
        }
        Ok(())
    }
}
