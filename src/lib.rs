//! # looprelax
//!
//! Edge-loop extraction and spline relaxation for polygon meshes.
//!
//! Given a selection of edges, looprelax finds the vertex loops they form,
//! optionally expands them to every loop running parallel to them, and
//! relaxes each loop toward a smooth, evenly spaced curve by fitting a cubic
//! or linear spline through every other vertex and pulling the remaining
//! vertices onto it.
//!
//! ## Features
//!
//! - **Editable polygon mesh**: vertex/edge/face arenas with selection and
//!   hidden flags, addressed by type-safe indices
//! - **Loop extraction**: open and circular loops from an edge selection,
//!   parallel loop expansion across quad strips
//! - **Relaxation**: natural cubic or linear splines, arc-length
//!   parameterization, regular or proportional spacing
//! - **Mirror modifiers**: loops are found on the mirrored result and written
//!   back to the editable vertices
//! - **File formats**: OBJ and PLY
//!
//! ## Quick Start
//!
//! ```no_run
//! use looprelax::prelude::*;
//!
//! let mut mesh: PolyMesh = looprelax::io::load("model.obj").unwrap();
//! mesh.select_vertices([VertexId::new(0), VertexId::new(1), VertexId::new(2)]);
//!
//! let mut object = MeshObject::new("Model", mesh);
//! let mut cache = TopologyCache::new();
//! let summary = relax(&mut object, &RelaxOptions::default(), &mut cache).unwrap();
//! println!("Relaxed {} loop(s)", summary.loops);
//!
//! looprelax::io::save(&object.mesh, "relaxed.obj").unwrap();
//! ```
//!
//! ## Finding Loops
//!
//! ```
//! use looprelax::prelude::*;
//! use looprelax::algo::loops::extract_loops;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: PolyMesh = build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();
//! mesh.select_vertices(mesh.vertex_ids().collect::<Vec<_>>());
//!
//! let loops = extract_loops(&mesh.selected_edge_keys());
//! assert_eq!(loops.len(), 1);
//! assert!(loops[0].circular);
//! assert_eq!(loops[0].len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use looprelax::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        relax, InputMode, Interpolation, Iterations, Loop, Progress, RelaxOptions, RelaxSummary,
        TopologyCache,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_quads, build_with_edges, to_face_vertex, EdgeId, EdgeKey,
        FaceId, MeshIndex, MeshObject, MirrorAxes, MirrorModifier, Modifier, PolyMesh, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
