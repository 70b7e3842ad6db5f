//! Loop relaxation.
//!
//! Relaxing smooths the selected loops of a mesh: each loop is split into
//! knot/point phases, a spline is fitted through the knots, and every point is
//! pulled halfway toward the spline. Repeating this converges toward evenly
//! spaced vertices on a smooth curve.
//!
//! # Pipeline
//!
//! 1. Evaluate the object's mirror modifiers, if any are enabled.
//! 2. Extract loops from the selected edges, optionally expand them to all
//!    parallel loops, map derived vertices back to editable ones and drop
//!    unusable loops. The result is cached per object and selection.
//! 3. For every iteration, parameterize, fit, evaluate, and write the new
//!    positions into a working copy of the mesh.
//! 4. Commit the working copy to the object.
//!
//! # Example
//!
//! ```
//! use looprelax::algo::relax::{relax, Iterations, RelaxOptions};
//! use looprelax::algo::spline::Interpolation;
//! use looprelax::algo::TopologyCache;
//! use looprelax::mesh::{build_with_edges, MeshObject, PolyMesh};
//! use nalgebra::Point3;
//!
//! let vertices: Vec<Point3<f64>> = [0.0, 1.0, 4.0, 4.5, 10.0]
//!     .iter()
//!     .map(|&x| Point3::new(x, 0.0, 0.0))
//!     .collect();
//! let faces: Vec<Vec<usize>> = Vec::new();
//! let edges = [[0, 1], [1, 2], [2, 3], [3, 4]];
//! let mut mesh: PolyMesh = build_with_edges(&vertices, &faces, &edges).unwrap();
//! mesh.select_vertices(mesh.vertex_ids().collect::<Vec<_>>());
//!
//! let mut object = MeshObject::new("Line", mesh);
//! let options = RelaxOptions::default()
//!     .with_interpolation(Interpolation::Linear)
//!     .with_iterations(Iterations::One);
//! let summary = relax(&mut object, &options, &mut TopologyCache::new()).unwrap();
//!
//! assert_eq!(summary.loops, 1);
//! assert_eq!(summary.moved_vertices, 3);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use nalgebra::Point3;

use super::cache::{CacheEntry, Fingerprint, TopologyCache};
use super::knots::{decompose, parameterize, Phase};
use super::loops::{extract_loops, validate_loops};
use super::parallel::parallel_loops;
use super::progress::Progress;
use super::spline::{Interpolation, Spline};
use super::writer::{write_positions, WriteOptions};
use crate::error::{MeshError, Result};
use crate::mesh::{DerivedMesh, Mapping, MeshIndex, MeshObject, PolyMesh, VertexId};

/// Cache key of the relax tool.
pub const RELAX_TOOL: &str = "Relax";

/// Which loops are relaxed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InputMode {
    /// Only the loops formed by the selected edges.
    #[default]
    Selected,
    /// The selected loops and every loop parallel to them.
    All,
}

/// Number of relax passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Iterations {
    /// One pass.
    #[default]
    One,
    /// Three passes.
    Three,
    /// Five passes.
    Five,
    /// Ten passes.
    Ten,
    /// Twenty-five passes.
    TwentyFive,
}

impl Iterations {
    /// All admissible values.
    pub const ALL: [Iterations; 5] = [
        Iterations::One,
        Iterations::Three,
        Iterations::Five,
        Iterations::Ten,
        Iterations::TwentyFive,
    ];

    /// Number of passes.
    pub fn count(self) -> usize {
        match self {
            Iterations::One => 1,
            Iterations::Three => 3,
            Iterations::Five => 5,
            Iterations::Ten => 10,
            Iterations::TwentyFive => 25,
        }
    }
}

impl TryFrom<usize> for Iterations {
    type Error = MeshError;

    fn try_from(value: usize) -> Result<Self> {
        Iterations::ALL
            .into_iter()
            .find(|it| it.count() == value)
            .ok_or_else(|| {
                MeshError::invalid_param("iterations", value, "must be one of 1, 3, 5, 10, 25")
            })
    }
}

impl fmt::Display for Iterations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

/// Options for loop relaxation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxOptions {
    /// Which loops are relaxed.
    pub input: InputMode,

    /// Spline type fitted through the knots.
    pub interpolation: Interpolation,

    /// Number of passes.
    pub iterations: Iterations,

    /// Distribute points evenly between their knots instead of keeping their
    /// relative arc-length spacing.
    pub regular: bool,
}

impl Default for RelaxOptions {
    fn default() -> Self {
        Self {
            input: InputMode::Selected,
            interpolation: Interpolation::Cubic,
            iterations: Iterations::One,
            regular: true,
        }
    }
}

impl RelaxOptions {
    /// Set the input mode.
    pub fn with_input(mut self, input: InputMode) -> Self {
        self.input = input;
        self
    }

    /// Set the interpolation.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the number of passes.
    pub fn with_iterations(mut self, iterations: Iterations) -> Self {
        self.iterations = iterations;
        self
    }

    /// Enable or disable regular spacing.
    pub fn with_regular(mut self, regular: bool) -> Self {
        self.regular = regular;
        self
    }
}

/// Outcome of a successful relax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaxSummary {
    /// Number of loops relaxed.
    pub loops: usize,

    /// Number of knot/point phases per pass.
    pub phases: usize,

    /// Number of distinct editable vertices written.
    pub moved_vertices: usize,

    /// Number of passes run.
    pub iterations: usize,

    /// Whether loop topology came from the cache.
    pub cache_hit: bool,
}

/// Compute one relax pass over the given phases.
///
/// Every target is computed from the positions in `mesh` as they are on
/// entry; the result pairs each point with the midpoint of its current
/// position and its position on the fitted spline.
pub fn relax_step<I: MeshIndex>(
    mesh: &PolyMesh<I>,
    phases: &[Phase<I>],
    interpolation: Interpolation,
    regular: bool,
) -> Vec<(VertexId<I>, Point3<f64>)> {
    let mut moves = Vec::new();

    for phase in phases {
        let params = parameterize(mesh, phase, regular);
        let Some(spline) = Spline::fit(interpolation, mesh, &phase.knots, &params.knots) else {
            continue;
        };
        for (&point, &m) in phase.points.iter().zip(&params.points) {
            let target = spline.evaluate(m);
            let current = mesh.position(point);
            moves.push((point, Point3::from((current.coords + target.coords) / 2.0)));
        }
    }

    moves
}

/// Relax the selected loops of an object.
///
/// On success the object's mesh holds the relaxed positions. If no usable
/// loop is found, [`MeshError::NoUsableLoops`] is returned and the mesh is
/// left untouched.
pub fn relax<I: MeshIndex>(
    object: &mut MeshObject<I>,
    options: &RelaxOptions,
    cache: &mut TopologyCache<I>,
) -> Result<RelaxSummary> {
    relax_with_progress(object, options, cache, &Progress::none())
}

/// Relax the selected loops of an object with progress reporting.
pub fn relax_with_progress<I: MeshIndex>(
    object: &mut MeshObject<I>,
    options: &RelaxOptions,
    cache: &mut TopologyCache<I>,
    progress: &Progress,
) -> Result<RelaxSummary> {
    let mut derived = DerivedMesh::evaluate(&object.mesh, &object.modifiers)?;
    let fingerprint = Fingerprint::new(object, options.input, false);

    let cached = cache
        .read(RELAX_TOOL, &fingerprint)
        .filter(|entry| entry.derived == derived.is_some())
        .cloned();
    let cache_hit = cached.is_some();
    let entry = match cached {
        Some(entry) => {
            log::debug!("reusing cached loop topology for '{}'", object.name);
            entry
        }
        None => {
            let entry = find_loops(&object.mesh, derived.as_ref(), options.input);
            cache.write(RELAX_TOOL, fingerprint, entry.clone());
            entry
        }
    };

    if entry.loops.is_empty() {
        return Err(MeshError::NoUsableLoops);
    }

    let phases = decompose(&entry.loops);
    let total = options.iterations.count();
    let mut working = object.mesh.clone();
    let mut moved: BTreeSet<VertexId<I>> = BTreeSet::new();

    for iteration in 0..total {
        progress.report(iteration, total, "Relaxing loops");

        let source = derived.as_ref().map_or(&working, DerivedMesh::mesh);
        let moves = relax_step(source, &phases, options.interpolation, options.regular);
        let written = write_positions(
            &mut working,
            &moves,
            entry.mapping.as_ref(),
            object.symmetry,
            &WriteOptions::default(),
        );
        moved.extend(written);

        if let Some(derived) = derived.as_mut() {
            derived.refresh_positions(&working);
        }
    }
    progress.report(total, total, "Relaxing loops");

    object.mesh = working;

    log::debug!(
        "relaxed {} loop(s) in {} phase(s), {} pass(es), {} vertices moved",
        entry.loops.len(),
        phases.len(),
        total,
        moved.len()
    );

    Ok(RelaxSummary {
        loops: entry.loops.len(),
        phases: phases.len(),
        moved_vertices: moved.len(),
        iterations: total,
        cache_hit,
    })
}

/// Extract, expand, map and validate the loops of the current selection.
pub fn find_loops<I: MeshIndex>(
    mesh: &PolyMesh<I>,
    derived: Option<&DerivedMesh<I>>,
    input: InputMode,
) -> CacheEntry<I> {
    let working = derived.map_or(mesh, DerivedMesh::mesh);

    let mut loops = extract_loops(&working.selected_edge_keys());
    if input == InputMode::All {
        loops = parallel_loops(working, &loops);
    }

    let mapping = derived.map(|d| {
        Mapping::build(
            mesh,
            d.mesh(),
            loops.iter().flat_map(|lp| lp.vertices.iter().copied()),
        )
    });
    let loops = validate_loops(loops, working, mapping.as_ref());

    CacheEntry {
        loops,
        derived: derived.is_some(),
        mapping,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::loops::Loop;
    use crate::mesh::{build_from_polygons, build_with_edges, Modifier, MirrorModifier};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn line_object(xs: &[f64]) -> MeshObject {
        let vertices: Vec<Point3<f64>> = xs.iter().map(|&x| Point3::new(x, 0.0, 0.0)).collect();
        let edges: Vec<[usize; 2]> = (1..xs.len()).map(|i| [i - 1, i]).collect();
        let faces: Vec<Vec<usize>> = Vec::new();
        let mut mesh: PolyMesh = build_with_edges(&vertices, &faces, &edges).unwrap();
        mesh.select_vertices(mesh.vertex_ids().collect::<Vec<_>>());
        MeshObject::new("Line", mesh)
    }

    fn hexagon_object() -> MeshObject {
        let vertices: Vec<Point3<f64>> = (0..6)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 6.0;
                Point3::new(angle.cos(), angle.sin(), 0.0)
            })
            .collect();
        let mut mesh: PolyMesh = build_from_polygons(&vertices, &[[0, 1, 2, 3, 4, 5]]).unwrap();
        mesh.select_vertices(mesh.vertex_ids().collect::<Vec<_>>());
        MeshObject::new("Hexagon", mesh)
    }

    fn x_of(object: &MeshObject, i: usize) -> f64 {
        object.mesh.position(VertexId::new(i)).x
    }

    /// Quad grid with the given column positions and `rows` rows one unit
    /// apart; vertex `y * columns + x` sits in row `y`, column `x`.
    fn grid_object(xs: &[f64], rows: usize) -> MeshObject {
        let columns = xs.len();
        let vertices: Vec<Point3<f64>> = (0..rows * columns)
            .map(|i| Point3::new(xs[i % columns], (i / columns) as f64, 0.0))
            .collect();
        let mut faces = Vec::new();
        for y in 0..rows - 1 {
            for x in 0..columns - 1 {
                let a = y * columns + x;
                faces.push([a, a + 1, a + columns + 1, a + columns]);
            }
        }
        let mesh: PolyMesh = build_from_polygons(&vertices, &faces).unwrap();
        MeshObject::new("Grid", mesh)
    }

    #[test]
    fn test_iterations_try_from() {
        assert_eq!(Iterations::try_from(10).unwrap(), Iterations::Ten);
        assert_eq!(Iterations::try_from(25).unwrap().count(), 25);
        assert!(matches!(
            Iterations::try_from(2),
            Err(MeshError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_options_builder() {
        let options = RelaxOptions::default()
            .with_input(InputMode::All)
            .with_interpolation(Interpolation::Linear)
            .with_iterations(Iterations::Five)
            .with_regular(false);

        assert_eq!(options.input, InputMode::All);
        assert_eq!(options.interpolation, Interpolation::Linear);
        assert_eq!(options.iterations.count(), 5);
        assert!(!options.regular);
    }

    #[test]
    fn test_uneven_line_moves_halfway() {
        for interpolation in [Interpolation::Linear, Interpolation::Cubic] {
            let mut object = line_object(&[0.0, 1.0, 4.0, 4.5, 10.0]);
            let options = RelaxOptions::default().with_interpolation(interpolation);
            let summary = relax(&mut object, &options, &mut TopologyCache::new()).unwrap();

            assert_eq!(summary.loops, 1);
            assert_eq!(summary.phases, 2);
            assert_eq!(summary.moved_vertices, 3);
            assert!((x_of(&object, 0) - 0.0).abs() < 1e-12);
            assert!((x_of(&object, 1) - 1.5).abs() < 1e-9);
            assert!((x_of(&object, 2) - 3.375).abs() < 1e-9);
            assert!((x_of(&object, 3) - 5.75).abs() < 1e-9);
            assert!((x_of(&object, 4) - 10.0).abs() < 1e-12);
            for (_, v) in object.mesh.vertices() {
                assert_eq!(v.position.y, 0.0);
                assert_eq!(v.position.z, 0.0);
            }
        }
    }

    #[test]
    fn test_even_line_is_fixed_point() {
        let mut object = line_object(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let before = object.mesh.clone();
        let options = RelaxOptions::default().with_iterations(Iterations::Ten);
        relax(&mut object, &options, &mut TopologyCache::new()).unwrap();

        for v in before.vertex_ids() {
            assert!((object.mesh.position(v) - before.position(v)).norm() < 1e-9);
        }
    }

    /// One cubic pass over a regular unit hexagon is not a fixed point: the
    /// vertices end up at radius r ≈ 0.939 (between about 0.9386 and
    /// 0.9395), which the bounds below bracket.
    #[test]
    fn test_hexagon_contracts_evenly() {
        let mut object = hexagon_object();
        relax(&mut object, &RelaxOptions::default(), &mut TopologyCache::new()).unwrap();

        // Every vertex is pulled slightly inward; the seam padding makes the
        // pull differ by about a thousandth between vertices
        let mesh = &object.mesh;
        let radii: Vec<f64> = (0..6)
            .map(|i| mesh.position(VertexId::new(i)).coords.norm())
            .collect();
        let min = radii.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = radii.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min > 0.9 && max < 1.0);
        assert!(max - min < 0.005);
        for i in 0..6 {
            let p = mesh.position(VertexId::new(i));
            assert!(p.coords.iter().all(|c| c.is_finite()));
            assert_eq!(p.z, 0.0);
        }
        // The ring is still closed and intact
        assert_eq!(mesh.num_edges(), 6);
        assert_eq!(mesh.face_vertices(crate::mesh::FaceId::new(0)).len(), 6);
    }

    #[test]
    fn test_no_usable_loops_leaves_mesh() {
        let mut object = line_object(&[0.0, 1.0, 2.0]);
        object.mesh.deselect_all();
        object.mesh.select_vertices([VertexId::new(0), VertexId::new(1)]);
        let before = object.mesh.clone();

        let result = relax(&mut object, &RelaxOptions::default(), &mut TopologyCache::new());
        assert!(matches!(result, Err(MeshError::NoUsableLoops)));
        for v in before.vertex_ids() {
            assert_eq!(object.mesh.position(v), before.position(v));
        }
    }

    #[test]
    fn test_degenerate_loop_is_skipped() {
        let mut object = line_object(&[2.0, 2.0, 2.0, 2.0]);
        let result = relax(&mut object, &RelaxOptions::default(), &mut TopologyCache::new());
        assert!(matches!(result, Err(MeshError::NoUsableLoops)));
    }

    #[test]
    fn test_second_call_hits_cache() {
        let mut object = line_object(&[0.0, 1.0, 4.0, 4.5, 10.0]);
        let mut cache = TopologyCache::new();

        let first = relax(&mut object, &RelaxOptions::default(), &mut cache).unwrap();
        let second = relax(&mut object, &RelaxOptions::default(), &mut cache).unwrap();
        assert!(!first.cache_hit);
        assert!(second.cache_hit);

        let third = relax(
            &mut object,
            &RelaxOptions::default().with_input(InputMode::All),
            &mut cache,
        )
        .unwrap();
        assert!(!third.cache_hit);
    }

    #[test]
    fn test_mirror_modifier_relaxes_across_plane() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.3, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let faces: Vec<Vec<usize>> = Vec::new();
        let mut mesh: PolyMesh = build_with_edges(&vertices, &faces, &[[0, 1], [1, 2]]).unwrap();
        mesh.select_vertices(mesh.vertex_ids().collect::<Vec<_>>());
        let mut object = MeshObject::new("Half", mesh)
            .with_modifier(Modifier::mirror("Mirror", MirrorModifier::default()));

        let options = RelaxOptions::default().with_interpolation(Interpolation::Linear);
        let summary = relax(&mut object, &options, &mut TopologyCache::new()).unwrap();

        // The loop runs over the mirrored half as well; only editable vertices move
        assert_eq!(object.mesh.num_vertices(), 3);
        assert_eq!(summary.moved_vertices, 2);
        let p0 = object.mesh.position(VertexId::new(0));
        let p1 = object.mesh.position(VertexId::new(1));
        assert!((p0 - Point3::new(0.0, 0.15, 0.0)).norm() < 1e-12);
        assert!((p1 - Point3::new(1.0, 0.15, 0.0)).norm() < 1e-12);
        assert_eq!(object.mesh.position(VertexId::new(2)), &Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_all_input_relaxes_parallel_rows() {
        let xs = [0.0, 1.0, 1.2, 3.5, 4.0];
        let mut object = grid_object(&xs, 4);
        object.mesh.select_vertices((5..10).map(VertexId::new));

        let options = RelaxOptions::default()
            .with_input(InputMode::All)
            .with_interpolation(Interpolation::Linear);
        let summary = relax(&mut object, &options, &mut TopologyCache::new()).unwrap();

        // Seed row plus the three rows parallel to it, two phases each
        assert_eq!(summary.loops, 4);
        assert_eq!(summary.phases, 8);
        assert_eq!(summary.moved_vertices, 12);

        // Every row relaxes like the selected one; boundary columns stay put
        let expected = [0.0, 0.8, 1.725, 3.05, 4.0];
        for row in 0..4 {
            for (column, &x) in expected.iter().enumerate() {
                let p = object.mesh.position(VertexId::new(row * 5 + column));
                assert!((p.x - x).abs() < 1e-12, "row {row} column {column}: {}", p.x);
                assert_eq!(p.y, row as f64);
                assert_eq!(p.z, 0.0);
            }
        }

        // Selected input leaves the parallel rows alone
        let mut object = grid_object(&xs, 4);
        object.mesh.select_vertices((5..10).map(VertexId::new));
        let options = options.with_input(InputMode::Selected);
        let summary = relax(&mut object, &options, &mut TopologyCache::new()).unwrap();
        assert_eq!(summary.loops, 1);
        assert_eq!(summary.moved_vertices, 3);
        assert_eq!(x_of(&object, 12), 1.2);
    }

    #[test]
    fn test_all_input_with_mirror_keeps_unselected_rows() {
        // Right half of a grid; column 0 lies on the mirror plane
        let mut object = grid_object(&[0.0, 1.0, 2.6, 3.0], 3)
            .with_modifier(Modifier::mirror("Mirror", MirrorModifier::default()));
        object.mesh.select_vertices((4..8).map(VertexId::new));
        let before = object.mesh.clone();

        let options = RelaxOptions::default()
            .with_input(InputMode::All)
            .with_interpolation(Interpolation::Linear);
        let summary = relax(&mut object, &options, &mut TopologyCache::new()).unwrap();

        // The mirrored rows are found, but only the selected row maps back to
        // editable vertices
        assert_eq!(summary.loops, 1);
        assert_eq!(summary.moved_vertices, 3);
        assert_eq!(object.mesh.num_vertices(), 12);

        // The seed row spans both halves: -3, -2.6, -1, 0, 1, 2.6, 3
        assert!(x_of(&object, 4).abs() < 1e-12);
        assert!((x_of(&object, 5) - 1.15).abs() < 1e-12);
        assert!((x_of(&object, 6) - 2.3).abs() < 1e-12);
        assert_eq!(x_of(&object, 7), 3.0);
        for i in (0..4).chain(8..12) {
            let v = VertexId::new(i);
            assert_eq!(object.mesh.position(v), before.position(v));
        }
    }

    #[test]
    fn test_relax_step_does_not_mutate() {
        let object = line_object(&[0.0, 1.0, 4.0]);
        let phases = decompose(&[Loop::new(
            vec![VertexId::new(0), VertexId::new(1), VertexId::new(2)],
            false,
        )]);
        let moves = relax_step(&object.mesh, &phases, Interpolation::Linear, true);

        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].0, VertexId::new(1));
        assert!((moves[0].1 - Point3::new(1.5, 0.0, 0.0)).norm() < 1e-12);
        assert_eq!(object.mesh.position(VertexId::new(1)).x, 1.0);
    }

    #[test]
    fn test_progress_reports_every_iteration() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let progress = Progress::new(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut object = line_object(&[0.0, 1.0, 4.0, 4.5, 10.0]);
        let options = RelaxOptions::default().with_iterations(Iterations::Three);
        relax_with_progress(&mut object, &options, &mut TopologyCache::new(), &progress).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
