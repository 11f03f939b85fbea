use super::arena::{Arena, EdgeId, FaceId, VertexId};
use crate::error::{Error, Result};
use crate::vector::DirectionVector;
use tracing::trace;

/// Rounds a point onto the fixed-point grid used by the orientation predicates.
pub(crate) fn quantize(p: &DirectionVector, scale: f64) -> [i64; 3] {
    [
        libm::round(p.x * scale) as i64,
        libm::round(p.y * scale) as i64,
        libm::round(p.z * scale) as i64,
    ]
}

/// Sign of the volume of the tetrahedron formed by `face` and `p`.
///
/// Negative when `p` lies on the outer side of the face, i.e. the face is
/// visible from `p`. Exact: the grid coordinates are widened to `i128`.
pub(crate) fn volume_sign(arena: &Arena, face: FaceId, p: VertexId) -> i32 {
    let [a, b, c] = arena.face(face).vertices.map(|v| arena.vertex(v).coords);
    let d = arena.vertex(p).coords;
    let sub = |u: [i64; 3]| {
        [
            u[0] as i128 - d[0] as i128,
            u[1] as i128 - d[1] as i128,
            u[2] as i128 - d[2] as i128,
        ]
    };
    let (a, b, c) = (sub(a), sub(b), sub(c));

    let vol = a[0] * (b[1] * c[2] - b[2] * c[1])
        + a[1] * (b[2] * c[0] - b[0] * c[2])
        + a[2] * (b[0] * c[1] - b[1] * c[0]);

    vol.signum() as i32
}

fn collinear(a: [i64; 3], b: [i64; 3], c: [i64; 3]) -> bool {
    let ab = [0, 1, 2].map(|i| b[i] as i128 - a[i] as i128);
    let ac = [0, 1, 2].map(|i| c[i] as i128 - a[i] as i128);
    ab[1] * ac[2] - ab[2] * ac[1] == 0
        && ab[2] * ac[0] - ab[0] * ac[2] == 0
        && ab[0] * ac[1] - ab[1] * ac[0] == 0
}

/// Incremental hull construction over an [`Arena`].
pub(crate) struct Builder {
    arena: Arena,
}

impl Builder {
    pub fn new(points: &[DirectionVector], scale: f64) -> Self {
        let mut arena = Arena::default();
        for (index, p) in points.iter().enumerate() {
            arena.add_vertex(quantize(p, scale), index);
        }
        Self { arena }
    }

    pub fn build(mut self) -> Result<Arena> {
        let order = self.seed()?;
        for p in order {
            if self.arena.vertex(p).processed {
                continue;
            }
            self.arena.vertex_mut(p).processed = true;
            if !self.add_one(p) {
                trace!(index = self.arena.vertex(p).index, "point inside hull, discarded");
            }
            self.clean_up();
            if self.arena.dead_slots() > self.arena.live_edges().len() {
                self.arena.compact();
            }
        }
        self.arena.compact();
        Ok(self.arena)
    }

    /// Builds the two-sided starting triangle and returns the insertion order,
    /// which begins with the first point off the triangle's plane.
    fn seed(&mut self) -> Result<Vec<VertexId>> {
        let n = self.arena.vertex_count();
        if n < 4 {
            return Err(Error::Hull(format!("need at least 4 points, got {}", n)));
        }
        let coords = |arena: &Arena, i: usize| arena.vertex(VertexId(i % n)).coords;

        let start = (0..n)
            .find(|&i| {
                !collinear(
                    coords(&self.arena, i),
                    coords(&self.arena, i + 1),
                    coords(&self.arena, i + 2),
                )
            })
            .ok_or_else(|| Error::Hull("all points are collinear".into()))?;

        let [v0, v1, v2] = [0, 1, 2].map(|k| VertexId((start + k) % n));
        for v in [v0, v1, v2] {
            self.arena.vertex_mut(v).processed = true;
        }

        let e0 = self.arena.add_edge(v0, v1);
        let e1 = self.arena.add_edge(v1, v2);
        let e2 = self.arena.add_edge(v2, v0);
        let f0 = self.arena.add_face([v0, v1, v2], [e0, e1, e2]);
        let f1 = self.arena.add_face([v2, v1, v0], [e1, e0, e2]);
        for e in [e0, e1, e2] {
            self.arena.edge_mut(e).faces = [Some(f0), Some(f1)];
        }

        let v3 = (3..n)
            .map(|k| VertexId((start + k) % n))
            .find(|&v| volume_sign(&self.arena, f0, v) != 0)
            .ok_or_else(|| Error::Hull("all points are coplanar".into()))?;

        Ok((0..n).map(|k| VertexId((v3.0 + k) % n)).collect())
    }

    /// Adds `p` to the hull. Returns `false` if `p` sees no face, i.e. lies inside.
    fn add_one(&mut self, p: VertexId) -> bool {
        let mut any_visible = false;
        for f in self.arena.live_faces() {
            if volume_sign(&self.arena, f, p) < 0 {
                self.arena.face_mut(f).visible = true;
                any_visible = true;
            }
        }
        if !any_visible {
            self.arena.vertex_mut(p).on_hull = false;
            return false;
        }

        for e in self.arena.live_edges() {
            let [fa, fb] = self.arena.edge(e).faces;
            let (va, vb) = (self.arena.is_visible(fa), self.arena.is_visible(fb));
            if va && vb {
                self.arena.edge_mut(e).remove = true;
            } else if va || vb {
                let cone = self.make_cone_face(e, p);
                self.arena.edge_mut(e).new_face = Some(cone);
            }
        }
        true
    }

    /// Creates the face joining the horizon edge `e` to `p`, wound like the visible
    /// face it replaces.
    fn make_cone_face(&mut self, e: EdgeId, p: VertexId) -> FaceId {
        let endpoints = self.arena.edge(e).endpoints;

        let mut side = [EdgeId(0); 2];
        for (slot, &v) in side.iter_mut().zip(endpoints.iter()) {
            *slot = match self.arena.vertex(v).duplicate {
                Some(existing) => existing,
                None => {
                    let created = self.arena.add_edge(v, p);
                    self.arena.vertex_mut(v).duplicate = Some(created);
                    created
                }
            };
        }

        let [fa, fb] = self.arena.edge(e).faces;
        let visible = if self.arena.is_visible(fa) { fa } else { fb };
        let same_order = visible.is_some_and(|f| {
            let vs = self.arena.face(f).vertices;
            let i = vs.iter().position(|&v| v == endpoints[0]).unwrap_or(0);
            vs[(i + 1) % 3] == endpoints[1]
        });

        let (vertices, edges) = if same_order {
            ([endpoints[0], endpoints[1], p], [e, side[1], side[0]])
        } else {
            ([endpoints[1], endpoints[0], p], [e, side[0], side[1]])
        };
        let face = self.arena.add_face(vertices, edges);

        for s in side {
            let faces = &mut self.arena.edge_mut(s).faces;
            if faces[0].is_none() {
                faces[0] = Some(face);
            } else if faces[1].is_none() {
                faces[1] = Some(face);
            }
        }
        face
    }

    fn clean_up(&mut self) {
        let edges = self.arena.live_edges();

        for &e in &edges {
            if let Some(cone) = self.arena.edge(e).new_face {
                let visible_first = self.arena.is_visible(self.arena.edge(e).faces[0]);
                let edge = self.arena.edge_mut(e);
                edge.faces[if visible_first { 0 } else { 1 }] = Some(cone);
                edge.new_face = None;
            }
        }
        for &e in &edges {
            if self.arena.edge(e).remove {
                self.arena.edge_mut(e).alive = false;
            }
        }
        for f in self.arena.live_faces() {
            if self.arena.face(f).visible {
                self.arena.face_mut(f).alive = false;
            }
        }

        for e in self.arena.live_edges() {
            let [a, b] = self.arena.edge(e).endpoints;
            self.arena.vertex_mut(a).on_hull = true;
            self.arena.vertex_mut(b).on_hull = true;
        }
        for v in self.arena.live_vertices() {
            let vertex = self.arena.vertex_mut(v);
            if vertex.processed && !vertex.on_hull {
                vertex.alive = false;
            }
        }
        for v in self.arena.live_vertices() {
            let vertex = self.arena.vertex_mut(v);
            vertex.duplicate = None;
            vertex.on_hull = false;
        }
    }
}
