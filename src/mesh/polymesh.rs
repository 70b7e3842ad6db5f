//! Editable polygon mesh.
//!
//! [`PolyMesh`] stores vertices, edges, and faces in flat arenas addressed by
//! stable typed indices. Unlike a half-edge structure it accepts arbitrary
//! polygon rings, wire edges without faces, and non-manifold edges shared by
//! more than two faces, which is the topology loop tools have to cope with.
//!
//! # Selection and Visibility
//!
//! Every vertex and edge carries a `selected` and a `hidden` flag; faces carry
//! a `hidden` flag. Selection is flushed the way interactive editors do it:
//! selecting vertices selects every edge whose two ends are selected, and
//! selecting an edge selects its two vertices.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, FaceId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// An unordered vertex pair, canonicalized so that `lo <= hi`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey<I: MeshIndex = u32> {
    lo: VertexId<I>,
    hi: VertexId<I>,
}

impl<I: MeshIndex> EdgeKey<I> {
    /// Create the canonical key of the edge between `a` and `b`.
    #[inline]
    pub fn new(a: VertexId<I>, b: VertexId<I>) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    /// The smaller vertex id.
    #[inline]
    pub fn lo(self) -> VertexId<I> {
        self.lo
    }

    /// The larger vertex id.
    #[inline]
    pub fn hi(self) -> VertexId<I> {
        self.hi
    }

    /// Both vertex ids, smaller first.
    #[inline]
    pub fn vertices(self) -> [VertexId<I>; 2] {
        [self.lo, self.hi]
    }

    /// Check whether `v` is one of the two ends.
    #[inline]
    pub fn contains(self, v: VertexId<I>) -> bool {
        self.lo == v || self.hi == v
    }

    /// The end opposite to `v`, or `None` if `v` is not on this edge.
    #[inline]
    pub fn other(self, v: VertexId<I>) -> Option<VertexId<I>> {
        if self.lo == v {
            Some(self.hi)
        } else if self.hi == v {
            Some(self.lo)
        } else {
            None
        }
    }
}

/// A vertex of the editable mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// Whether the vertex is selected.
    pub selected: bool,

    /// Whether the vertex is hidden.
    pub hidden: bool,
}

impl Vertex {
    /// Create a new unselected, visible vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            selected: false,
            hidden: false,
        }
    }

    /// Create a new vertex from coordinates.
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// An edge of the editable mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge<I: MeshIndex = u32> {
    /// The canonical vertex pair.
    pub key: EdgeKey<I>,

    /// Whether the edge is selected.
    pub selected: bool,

    /// Whether the edge is hidden.
    pub hidden: bool,
}

/// A polygon face, stored as an ordered ring of vertex ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Face<I: MeshIndex = u32> {
    /// The vertex ring (counter-clockwise, first vertex not repeated).
    pub vertices: Vec<VertexId<I>>,

    /// Whether the face is hidden.
    pub hidden: bool,
}

impl<I: MeshIndex> Face<I> {
    /// Iterate over the canonical keys of the face's edges, in ring order.
    pub fn edge_keys(&self) -> impl Iterator<Item = EdgeKey<I>> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| EdgeKey::new(self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

/// An editable polygon mesh with selection state.
#[derive(Debug, Clone)]
pub struct PolyMesh<I: MeshIndex = u32> {
    /// All vertices in the mesh.
    pub(crate) vertices: Vec<Vertex>,

    /// All edges in the mesh.
    pub(crate) edges: Vec<Edge<I>>,

    /// All faces in the mesh.
    pub(crate) faces: Vec<Face<I>>,

    /// Lookup from canonical key to edge id.
    pub(crate) edge_lookup: HashMap<EdgeKey<I>, EdgeId<I>>,
}

impl<I: MeshIndex> Default for PolyMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> PolyMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
            edge_lookup: HashMap::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Quad-dominant meshes have roughly two edges per face
        let num_edges = num_faces * 2 + num_faces / 2;

        Self {
            vertices: Vec::with_capacity(num_vertices),
            edges: Vec::with_capacity(num_edges),
            faces: Vec::with_capacity(num_faces),
            edge_lookup: HashMap::with_capacity(num_edges),
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by ID.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex {
        &mut self.vertices[id.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, id: EdgeId<I>) -> &Edge<I> {
        &self.edges[id.index()]
    }

    /// Get a mutable edge by ID.
    #[inline]
    pub fn edge_mut(&mut self, id: EdgeId<I>) -> &mut Edge<I> {
        &mut self.edges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Get a mutable face by ID.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId<I>) -> &mut Face<I> {
        &mut self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    /// Check whether a vertex id addresses a vertex of this mesh.
    #[inline]
    pub fn contains_vertex(&self, v: VertexId<I>) -> bool {
        v.is_valid() && v.index() < self.vertices.len()
    }

    /// Look up the edge between two vertices.
    #[inline]
    pub fn find_edge(&self, key: EdgeKey<I>) -> Option<EdgeId<I>> {
        self.edge_lookup.get(&key).copied()
    }

    /// Get the vertex ring of a face.
    #[inline]
    pub fn face_vertices(&self, f: FaceId<I>) -> &[VertexId<I>] {
        &self.face(f).vertices
    }

    /// Iterate over the edge keys of a face in ring order.
    pub fn face_edge_keys(&self, f: FaceId<I>) -> impl Iterator<Item = EdgeKey<I>> + '_ {
        self.face(f).edge_keys()
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all vertices with their IDs.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &Vertex)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (VertexId::new(i), v))
    }

    /// Iterate over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Iterate over all edges with their IDs.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId<I>, &Edge<I>)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId::new(i), e))
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over all faces with their IDs.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId<I>, &Face<I>)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .map(|(i, f)| (FaceId::new(i), f))
    }

    // ==================== Selection ====================

    /// Keys of all edges that are selected and visible, in edge order.
    pub fn selected_edge_keys(&self) -> Vec<EdgeKey<I>> {
        self.edges
            .iter()
            .filter(|e| e.selected && !e.hidden)
            .map(|e| e.key)
            .collect()
    }

    /// Ids of all vertices that are selected and visible, in ascending order.
    pub fn selected_vertex_ids(&self) -> Vec<VertexId<I>> {
        self.vertices()
            .filter(|(_, v)| v.selected && !v.hidden)
            .map(|(id, _)| id)
            .collect()
    }

    /// Select vertices and flush the selection to edges whose ends are both selected.
    pub fn select_vertices<T>(&mut self, ids: T)
    where
        T: IntoIterator<Item = VertexId<I>>,
    {
        for v in ids {
            if self.contains_vertex(v) {
                self.vertices[v.index()].selected = true;
            }
        }
        for e in 0..self.edges.len() {
            let [a, b] = self.edges[e].key.vertices();
            if self.vertices[a.index()].selected && self.vertices[b.index()].selected {
                self.edges[e].selected = true;
            }
        }
    }

    /// Select the edge between two vertices together with its ends.
    ///
    /// Returns `false` if no such edge exists.
    pub fn select_edge(&mut self, key: EdgeKey<I>) -> bool {
        let Some(id) = self.find_edge(key) else {
            return false;
        };
        self.edges[id.index()].selected = true;
        for v in key.vertices() {
            self.vertices[v.index()].selected = true;
        }
        true
    }

    /// Clear the selection of every vertex and edge.
    pub fn deselect_all(&mut self) {
        for v in &mut self.vertices {
            v.selected = false;
        }
        for e in &mut self.edges {
            e.selected = false;
        }
    }

    /// Hide a vertex together with its incident edges and faces.
    pub fn hide_vertex(&mut self, v: VertexId<I>) {
        if !self.contains_vertex(v) {
            return;
        }
        self.vertices[v.index()].hidden = true;
        for e in &mut self.edges {
            if e.key.contains(v) {
                e.hidden = true;
            }
        }
        for f in &mut self.faces {
            if f.vertices.contains(&v) {
                f.hidden = true;
            }
        }
    }

    // ==================== Geometry ====================

    /// Compute the length of an edge.
    pub fn edge_length(&self, key: EdgeKey<I>) -> f64 {
        (self.position(key.hi()) - self.position(key.lo())).norm()
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let ring = self.face_vertices(f);
        let sum: Vector3<f64> = ring.iter().map(|&v| self.position(v).coords).sum();
        Point3::from(sum / ring.len() as f64)
    }

    /// Compute the normal of a face with Newell's method (valid for non-planar polygons).
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let ring = self.face_vertices(f);
        let mut normal = Vector3::zeros();
        for i in 0..ring.len() {
            let p = self.position(ring[i]);
            let q = self.position(ring[(i + 1) % ring.len()]);
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
        }
        normal.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min = self.vertices[0].position;
        let mut max = self.vertices[0].position;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    /// Add an edge between two existing vertices, returning the existing edge if present.
    pub fn add_edge(&mut self, a: VertexId<I>, b: VertexId<I>) -> Result<EdgeId<I>> {
        if a == b || !self.contains_vertex(a) || !self.contains_vertex(b) {
            return Err(MeshError::InvalidEdge {
                v0: a.index(),
                v1: b.index(),
            });
        }
        let key = EdgeKey::new(a, b);
        if let Some(id) = self.find_edge(key) {
            return Ok(id);
        }
        let id = EdgeId::new(self.edges.len());
        self.edges.push(Edge {
            key,
            selected: false,
            hidden: false,
        });
        self.edge_lookup.insert(key, id);
        Ok(id)
    }

    /// Add a polygon face, creating any missing edges of its ring.
    pub fn add_face(&mut self, ring: &[VertexId<I>]) -> Result<FaceId<I>> {
        let face_index = self.faces.len();
        if ring.len() < 3 {
            return Err(MeshError::DegenerateFace { face: face_index });
        }
        for &v in ring {
            if !self.contains_vertex(v) {
                return Err(MeshError::InvalidVertexIndex {
                    face: face_index,
                    vertex: v.index(),
                });
            }
        }
        for (i, v) in ring.iter().enumerate() {
            if ring[i + 1..].contains(v) {
                return Err(MeshError::DegenerateFace { face: face_index });
            }
        }

        for i in 0..ring.len() {
            self.add_edge(ring[i], ring[(i + 1) % ring.len()])?;
        }
        let id = FaceId::new(face_index);
        self.faces.push(Face {
            vertices: ring.to_vec(),
            hidden: false,
        });
        Ok(id)
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid (all references are in range and consistent).
    pub fn is_valid(&self) -> bool {
        for (eid, e) in self.edges() {
            let [a, b] = e.key.vertices();
            if a == b || !self.contains_vertex(a) || !self.contains_vertex(b) {
                return false;
            }
            if self.find_edge(e.key) != Some(eid) {
                return false;
            }
        }

        for (_fid, f) in self.faces() {
            if f.vertices.len() < 3 {
                return false;
            }
            if f.edge_keys().any(|key| self.find_edge(key).is_none()) {
                return false;
            }
        }

        self.edge_lookup.len() == self.edges.len()
    }
}
