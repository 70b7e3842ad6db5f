//! Adjacency tables derived from a [`PolyMesh`].
//!
//! Loop tools only need a handful of relations: which vertices a set of edges
//! connects, which faces use an edge, and which faces touch each other through
//! a shared edge. The tables are built on demand and never cached by the mesh.
//! Hidden elements are left out.

use std::collections::{BTreeMap, HashMap};

use super::index::{FaceId, MeshIndex, VertexId};
use super::polymesh::{EdgeKey, PolyMesh};

/// Vertex to neighboring vertices, restricted to a given edge set.
///
/// Keys iterate in ascending vertex order; each neighbor list keeps the order
/// in which the edges were supplied.
pub fn vertex_neighbors<I: MeshIndex>(
    edge_keys: &[EdgeKey<I>],
) -> BTreeMap<VertexId<I>, Vec<VertexId<I>>> {
    let mut neighbors: BTreeMap<VertexId<I>, Vec<VertexId<I>>> = BTreeMap::new();
    for key in edge_keys {
        let [a, b] = key.vertices();
        if a == b {
            continue;
        }
        neighbors.entry(a).or_default().push(b);
        neighbors.entry(b).or_default().push(a);
    }
    neighbors
}

/// Face adjacency of the visible part of a mesh.
#[derive(Debug, Clone)]
pub struct FaceAdjacency<I: MeshIndex = u32> {
    /// Faces using each visible edge, in face order.
    edge_faces: HashMap<EdgeKey<I>, Vec<FaceId<I>>>,

    /// Faces sharing at least one edge with each visible face.
    /// A face appears once per shared edge.
    face_faces: HashMap<FaceId<I>, Vec<FaceId<I>>>,
}

impl<I: MeshIndex> FaceAdjacency<I> {
    /// Build the adjacency tables of all visible edges and faces.
    pub fn new(mesh: &PolyMesh<I>) -> Self {
        let mut edge_faces: HashMap<EdgeKey<I>, Vec<FaceId<I>>> = mesh
            .edges()
            .filter(|(_, e)| !e.hidden)
            .map(|(_, e)| (e.key, Vec::new()))
            .collect();

        for (fid, face) in mesh.faces() {
            if face.hidden {
                continue;
            }
            for key in face.edge_keys() {
                if let Some(faces) = edge_faces.get_mut(&key) {
                    faces.push(fid);
                }
            }
        }

        let mut face_faces: HashMap<FaceId<I>, Vec<FaceId<I>>> = HashMap::new();
        for (fid, face) in mesh.faces() {
            if face.hidden {
                continue;
            }
            let connected = face_faces.entry(fid).or_default();
            for key in face.edge_keys() {
                if let Some(faces) = edge_faces.get(&key) {
                    connected.extend(faces.iter().copied().filter(|&other| other != fid));
                }
            }
        }

        Self {
            edge_faces,
            face_faces,
        }
    }

    /// Faces using an edge, or `None` if the edge is hidden or absent.
    pub fn faces_of_edge(&self, key: EdgeKey<I>) -> Option<&[FaceId<I>]> {
        self.edge_faces.get(&key).map(Vec::as_slice)
    }

    /// Check whether two faces share an edge.
    pub fn are_adjacent(&self, a: FaceId<I>, b: FaceId<I>) -> bool {
        self.face_faces
            .get(&a)
            .is_some_and(|connected| connected.contains(&b))
    }

    /// Number of visible edges.
    pub fn num_edges(&self) -> usize {
        self.edge_faces.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_polygons;
    use nalgebra::Point3;

    fn strip() -> PolyMesh {
        // Three quads in a row
        let vertices: Vec<Point3<f64>> = (0..8)
            .map(|i| Point3::new((i % 4) as f64, (i / 4) as f64, 0.0))
            .collect();
        let faces = vec![[0, 1, 5, 4], [1, 2, 6, 5], [2, 3, 7, 6]];
        build_from_polygons(&vertices, &faces).unwrap()
    }

    fn v(i: usize) -> VertexId {
        VertexId::new(i)
    }

    #[test]
    fn test_vertex_neighbors_keeps_edge_order() {
        let keys = vec![
            EdgeKey::new(v(2), v(1)),
            EdgeKey::new(v(1), v(0)),
            EdgeKey::new(v(1), v(3)),
        ];
        let neighbors = vertex_neighbors(&keys);

        assert_eq!(neighbors.keys().copied().collect::<Vec<_>>(), vec![v(0), v(1), v(2), v(3)]);
        assert_eq!(neighbors[&v(1)], vec![v(2), v(0), v(3)]);
        assert_eq!(neighbors[&v(3)], vec![v(1)]);
    }

    #[test]
    fn test_edge_faces() {
        let mesh = strip();
        let adjacency = FaceAdjacency::new(&mesh);

        assert_eq!(adjacency.num_edges(), 10);
        assert_eq!(adjacency.faces_of_edge(EdgeKey::new(v(1), v(5))).unwrap().len(), 2);
        assert_eq!(adjacency.faces_of_edge(EdgeKey::new(v(0), v(1))).unwrap().len(), 1);
        assert!(adjacency.faces_of_edge(EdgeKey::new(v(0), v(2))).is_none());
    }

    #[test]
    fn test_face_faces() {
        let mesh = strip();
        let adjacency = FaceAdjacency::new(&mesh);

        assert!(adjacency.are_adjacent(FaceId::new(0), FaceId::new(1)));
        assert!(adjacency.are_adjacent(FaceId::new(2), FaceId::new(1)));
        assert!(!adjacency.are_adjacent(FaceId::new(0), FaceId::new(2)));
    }

    #[test]
    fn test_hidden_faces_are_skipped() {
        let mut mesh = strip();
        mesh.hide_vertex(v(3));
        let adjacency = FaceAdjacency::new(&mesh);

        assert!(adjacency.faces_of_edge(EdgeKey::new(v(2), v(3))).is_none());
        assert_eq!(adjacency.faces_of_edge(EdgeKey::new(v(2), v(6))).unwrap().len(), 1);
        assert!(!adjacency.are_adjacent(FaceId::new(1), FaceId::new(2)));
    }
}
