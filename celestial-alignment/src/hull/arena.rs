//! Index-based storage for the hull's vertex/edge/face graph.
//!
//! Records refer to each other through typed handles into three growable
//! vectors. Deleting a record clears its `alive` flag; dead edges and faces are
//! squeezed out by [`Arena::compact`], which rewrites every handle that points at
//! a moved slot. Vertices are never moved, so handles held by the builder's
//! processing order stay valid for the whole construction.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct VertexId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EdgeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FaceId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) struct Vertex {
    /// Fixed-point copy of the input coordinates.
    pub coords: [i64; 3],
    /// Position of the point in the caller's input slice.
    pub index: usize,
    /// Cone edge already created from this vertex to the point being inserted.
    pub duplicate: Option<EdgeId>,
    pub on_hull: bool,
    pub processed: bool,
    pub alive: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Edge {
    pub endpoints: [VertexId; 2],
    pub faces: [Option<FaceId>; 2],
    /// Cone face that replaces the visible neighbour once the insertion completes.
    pub new_face: Option<FaceId>,
    pub remove: bool,
    pub alive: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Face {
    /// `edges[i]` joins `vertices[i]` and `vertices[(i + 1) % 3]`.
    pub edges: [EdgeId; 3],
    /// Counter-clockwise when seen from outside the hull.
    pub vertices: [VertexId; 3],
    pub visible: bool,
    pub alive: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Arena {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
}

impl Arena {
    pub fn add_vertex(&mut self, coords: [i64; 3], index: usize) -> VertexId {
        self.vertices.push(Vertex {
            coords,
            index,
            duplicate: None,
            on_hull: false,
            processed: false,
            alive: true,
        });
        VertexId(self.vertices.len() - 1)
    }

    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        self.edges.push(Edge {
            endpoints: [a, b],
            faces: [None, None],
            new_face: None,
            remove: false,
            alive: true,
        });
        EdgeId(self.edges.len() - 1)
    }

    pub fn add_face(&mut self, vertices: [VertexId; 3], edges: [EdgeId; 3]) -> FaceId {
        self.faces.push(Face {
            edges,
            vertices,
            visible: false,
            alive: true,
        });
        FaceId(self.faces.len() - 1)
    }

    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }

    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.0]
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    #[inline]
    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.0]
    }

    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.0]
    }

    #[inline]
    pub fn face_mut(&mut self, id: FaceId) -> &mut Face {
        &mut self.faces[id.0]
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn live_vertices(&self) -> Vec<VertexId> {
        live_ids(&self.vertices, |v| v.alive, VertexId)
    }

    pub fn live_edges(&self) -> Vec<EdgeId> {
        live_ids(&self.edges, |e| e.alive, EdgeId)
    }

    pub fn live_faces(&self) -> Vec<FaceId> {
        live_ids(&self.faces, |f| f.alive, FaceId)
    }

    pub fn is_visible(&self, face: Option<FaceId>) -> bool {
        face.is_some_and(|f| self.face(f).visible)
    }

    /// Number of dead edge and face slots still occupying storage.
    pub fn dead_slots(&self) -> usize {
        self.edges.iter().filter(|e| !e.alive).count()
            + self.faces.iter().filter(|f| !f.alive).count()
    }

    /// Drops dead edges and faces and renumbers the survivors.
    pub fn compact(&mut self) {
        let (edges, edge_map) = retain_alive(std::mem::take(&mut self.edges), |e| e.alive);
        let (faces, face_map) = retain_alive(std::mem::take(&mut self.faces), |f| f.alive);
        self.edges = edges;
        self.faces = faces;

        for edge in &mut self.edges {
            for slot in edge.faces.iter_mut() {
                *slot = slot.and_then(|f| face_map[f.0].map(FaceId));
            }
            edge.new_face = edge.new_face.and_then(|f| face_map[f.0].map(FaceId));
        }
        // Live faces only reference live edges; a dangling handle is left as is
        // and reported by `ConvexHull::check_consistency`.
        for face in &mut self.faces {
            for slot in face.edges.iter_mut() {
                if let Some(moved) = edge_map[slot.0] {
                    *slot = EdgeId(moved);
                }
            }
        }
        for vertex in &mut self.vertices {
            vertex.duplicate = vertex.duplicate.and_then(|e| edge_map[e.0].map(EdgeId));
        }
    }
}

fn live_ids<T, I>(items: &[T], alive: impl Fn(&T) -> bool, wrap: impl Fn(usize) -> I) -> Vec<I> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| alive(item))
        .map(|(i, _)| wrap(i))
        .collect()
}

fn retain_alive<T>(items: Vec<T>, alive: impl Fn(&T) -> bool) -> (Vec<T>, Vec<Option<usize>>) {
    let mut map = Vec::with_capacity(items.len());
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        if alive(&item) {
            map.push(Some(kept.len()));
            kept.push(item);
        } else {
            map.push(None);
        }
    }
    (kept, map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_renumbers_handles() {
        let mut arena = Arena::default();
        let a = arena.add_vertex([0, 0, 0], 0);
        let b = arena.add_vertex([1, 0, 0], 1);
        let c = arena.add_vertex([0, 1, 0], 2);
        let dead = arena.add_edge(a, b);
        let ab = arena.add_edge(a, b);
        let bc = arena.add_edge(b, c);
        let ca = arena.add_edge(c, a);
        let stale = arena.add_face([a, b, c], [dead, bc, ca]);
        let face = arena.add_face([a, b, c], [ab, bc, ca]);
        for e in [ab, bc, ca] {
            arena.edge_mut(e).faces = [Some(stale), Some(face)];
        }
        arena.edge_mut(dead).alive = false;
        arena.face_mut(stale).alive = false;
        assert_eq!(arena.dead_slots(), 2);

        arena.compact();

        assert_eq!(arena.dead_slots(), 0);
        assert_eq!(arena.live_edges().len(), 3);
        let faces = arena.live_faces();
        assert_eq!(faces, vec![FaceId(0)]);
        assert_eq!(arena.face(FaceId(0)).edges, [EdgeId(0), EdgeId(1), EdgeId(2)]);
        assert_eq!(arena.edge(EdgeId(0)).faces, [None, Some(FaceId(0))]);
        assert_eq!(arena.edge(EdgeId(0)).endpoints, [a, b]);
    }

    #[test]
    fn visibility_of_missing_face_is_false() {
        let arena = Arena::default();
        assert!(!arena.is_visible(None));
    }
}
