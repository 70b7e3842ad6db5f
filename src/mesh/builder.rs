//! Mesh construction utilities.
//!
//! This module provides functions for building editable meshes from
//! face-vertex lists as commonly found in mesh file formats, optionally
//! with extra wire edges (edges not bounding any face).

use nalgebra::Point3;

use super::index::{MeshIndex, VertexId};
use super::polymesh::PolyMesh;
use crate::error::{MeshError, Result};

/// Build a polygon mesh from vertices and polygon faces.
///
/// Each face is an ordered ring of at least three distinct vertex indices.
/// Edges are derived from the rings and de-duplicated.
///
/// # Example
/// ```
/// use looprelax::mesh::{build_from_polygons, PolyMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(2.0, 0.5, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3], vec![1, 4, 2]];
///
/// let mesh: PolyMesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_faces(), 2);
/// assert_eq!(mesh.num_edges(), 6);
/// ```
pub fn build_from_polygons<I: MeshIndex, F: AsRef<[usize]>>(
    vertices: &[Point3<f64>],
    faces: &[F],
) -> Result<PolyMesh<I>> {
    build_with_edges(vertices, faces, &[])
}

/// Build a polygon mesh from vertices, polygon faces, and wire edges.
///
/// Wire edges may duplicate face edges; duplicates are merged.
pub fn build_with_edges<I: MeshIndex, F: AsRef<[usize]>>(
    vertices: &[Point3<f64>],
    faces: &[F],
    edges: &[[usize; 2]],
) -> Result<PolyMesh<I>> {
    if faces.is_empty() && edges.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    // Validate vertex indices
    for (fi, face) in faces.iter().enumerate() {
        let ring = face.as_ref();
        for &vi in ring {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        // Check for degenerate faces
        if ring.len() < 3 || (0..ring.len()).any(|i| ring[i + 1..].contains(&ring[i])) {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = PolyMesh::with_capacity(vertices.len(), faces.len());

    // Add vertices
    let vertex_ids: Vec<VertexId<I>> = vertices.iter().map(|&pos| mesh.add_vertex(pos)).collect();

    // Faces create their ring edges on insertion
    for face in faces {
        let ring: Vec<VertexId<I>> = face.as_ref().iter().map(|&vi| vertex_ids[vi]).collect();
        mesh.add_face(&ring)?;
    }

    for &[a, b] in edges {
        if a >= vertices.len() || b >= vertices.len() {
            return Err(MeshError::InvalidEdge { v0: a, v1: b });
        }
        mesh.add_edge(vertex_ids[a], vertex_ids[b])?;
    }

    Ok(mesh)
}

/// Build a polygon mesh from vertices and quad faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of quad faces, each as [v0, v1, v2, v3] indices (counter-clockwise)
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<PolyMesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Convert a mesh back to a face-vertex representation.
///
/// Returns (vertices, faces, wire edges). Wire edges are the edges that bound no face.
pub fn to_face_vertex<I: MeshIndex>(
    mesh: &PolyMesh<I>,
) -> (Vec<Point3<f64>>, Vec<Vec<usize>>, Vec<[usize; 2]>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<Vec<usize>> = mesh
        .faces()
        .map(|(_, f)| f.vertices.iter().map(|v| v.index()).collect())
        .collect();

    let mut on_face = vec![false; mesh.num_edges()];
    for (_, f) in mesh.faces() {
        for key in f.edge_keys() {
            if let Some(e) = mesh.find_edge(key) {
                on_face[e.index()] = true;
            }
        }
    }
    let wires: Vec<[usize; 2]> = mesh
        .edges()
        .filter(|(id, _)| !on_face[id.index()])
        .map(|(_, e)| [e.key.lo().index(), e.key.hi().index()])
        .collect();

    (vertices, faces, wires)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_quads() -> (Vec<Point3<f64>>, Vec<[usize; 4]>) {
        // Two quads sharing an edge (1-2)
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2, 3], [1, 4, 5, 2]];
        (vertices, faces)
    }

    #[test]
    fn test_build_from_quads_two_quads() {
        let (vertices, faces) = two_quads();
        let mesh: PolyMesh<u32> = build_from_quads(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_faces(), 2);
        // Shared edge is stored once
        assert_eq!(mesh.num_edges(), 7);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_roundtrip() {
        let (vertices, faces) = two_quads();
        let mesh: PolyMesh<u32> = build_from_quads(&vertices, &faces).unwrap();

        let (out_verts, out_faces, wires) = to_face_vertex(&mesh);

        assert_eq!(vertices.len(), out_verts.len());
        assert_eq!(out_faces, vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]]);
        assert!(wires.is_empty());

        for (v_in, v_out) in vertices.iter().zip(out_verts.iter()) {
            assert!((v_in - v_out).norm() < 1e-10);
        }
    }

    #[test]
    fn test_wire_edges() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let faces: Vec<Vec<usize>> = Vec::new();
        let mesh: PolyMesh<u32> = build_with_edges(&vertices, &faces, &[[0, 1], [2, 1]]).unwrap();

        assert_eq!(mesh.num_edges(), 2);
        assert_eq!(mesh.num_faces(), 0);

        let (_, _, wires) = to_face_vertex(&mesh);
        assert_eq!(wires, vec![[0, 1], [1, 2]]);
    }

    #[test]
    fn test_empty_input() {
        let faces: Vec<Vec<usize>> = Vec::new();
        let result: Result<PolyMesh<u32>> = build_from_polygons(&[], &faces);
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces = vec![[0, 1, 2]];

        let result: Result<PolyMesh<u32>> = build_from_polygons(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_degenerate_face() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        // Degenerate: v0 == v2 (diagonal vertices the same)
        let faces = vec![[0, 1, 0, 3]];

        let result: Result<PolyMesh<u32>> = build_from_quads(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }
}
