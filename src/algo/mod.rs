//! Loop algorithms.
//!
//! This module contains the loop pipeline, leaves first:
//!
//! - **Loops**: extraction of vertex chains from selected edges, validation
//! - **Parallel**: expansion to every loop parallel to a seed loop
//! - **Knots**: knot/point phases and arc-length parameters
//! - **Spline**: natural cubic and linear spline fitting
//! - **Writer**: applying computed positions (axis lock, influence, symmetry)
//! - **Cache**: per-tool topology cache
//! - **Relax**: the relax operation driving all of the above
//! - **Plane**: best-fit plane through loop vertices

pub mod cache;
pub mod knots;
pub mod loops;
pub mod parallel;
pub mod plane;
pub mod progress;
pub mod relax;
pub mod spline;
pub mod writer;

pub use cache::{CacheEntry, Fingerprint, TopologyCache};
pub use loops::Loop;
pub use progress::Progress;
pub use relax::{find_loops, relax, relax_with_progress, InputMode, Iterations, RelaxOptions, RelaxSummary};
pub use spline::Interpolation;
