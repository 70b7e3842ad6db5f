//! Core mesh data structures.
//!
//! This module provides the editable polygon mesh and the object-level state
//! that loop tools operate on.
//!
//! # Overview
//!
//! The primary type is [`PolyMesh`], an arena-based polygon mesh with
//! per-element selection and visibility flags. It accepts arbitrary polygons,
//! wire edges, and non-manifold edges. A [`MeshObject`] wraps a mesh together
//! with its name, modifier stack, and symmetry axes; [`DerivedMesh`] evaluates
//! the mirror modifiers of that stack.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`EdgeId`] - Identifies an edge
//! - [`FaceId`] - Identifies a face
//!
//! The storage type behind them is the [`MeshIndex`] trait, implemented for
//! `u32`; [`VertexId::invalid`] marks an unmapped derived vertex.
//!
//! # Construction
//!
//! Meshes are typically constructed from file I/O or from face-vertex lists:
//!
//! ```
//! use looprelax::mesh::{build_from_polygons, PolyMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2, 3]];
//!
//! let mesh: PolyMesh = build_from_polygons(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_edges(), 4);
//! ```

mod builder;
mod derived;
mod index;
mod object;
mod polymesh;
mod topology;

pub use builder::{build_from_polygons, build_from_quads, build_with_edges, to_face_vertex};
pub use derived::{DerivedMesh, Mapping, MAPPING_TOLERANCE};
pub use index::{EdgeId, FaceId, MeshIndex, VertexId};
pub use object::{MeshObject, MirrorAxes, MirrorModifier, Modifier, ModifierKind};
pub use polymesh::{Edge, EdgeKey, Face, PolyMesh, Vertex};
pub use topology::{vertex_neighbors, FaceAdjacency};
