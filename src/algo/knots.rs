//! Knot/point decomposition and arc-length parameterization.
//!
//! Relaxing a loop alternates vertex roles: *knots* anchor a spline and
//! *points* are pulled toward it. A loop is decomposed into up to two
//! [`Phase`]s with opposite role parity, so that every interior vertex is a
//! point in one of them.
//!
//! Within a phase, knots and points interleave: walking knot, point, knot,
//! point, ... reproduces the loop order. [`parameterize`] walks that order to
//! assign each knot and point its cumulative arc length.

use nalgebra::Point3;

use super::loops::Loop;
use crate::mesh::{MeshIndex, PolyMesh, VertexId};

/// One alternation of knot and point roles over a loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase<I: MeshIndex = u32> {
    /// Spline anchors in loop order. Closed rings repeat the first knot at the end.
    pub knots: Vec<VertexId<I>>,

    /// Vertices to move, in loop order.
    pub points: Vec<VertexId<I>>,
}

impl<I: MeshIndex> Phase<I> {
    /// Check whether the knot sequence closes onto itself.
    pub fn is_closed(&self) -> bool {
        self.knots.len() > 1 && self.knots.first() == self.knots.last()
    }

    /// The knot/point walk in loop order, flagged `true` for knots.
    fn interleaved(&self) -> Vec<(bool, VertexId<I>)> {
        let amount = self.knots.len() + self.points.len();
        (0..amount)
            .filter_map(|j| {
                if j % 2 == 0 {
                    self.knots.get(j / 2).map(|&v| (true, v))
                } else if j == amount - 1 {
                    self.knots.last().map(|&v| (true, v))
                } else {
                    self.points.get(j / 2).map(|&v| (false, v))
                }
            })
            .collect()
    }
}

/// Split every loop into its knot/point phases.
///
/// Circular loops of even length get their last vertex prepended and their
/// first vertex appended before the walk, so the alternation wraps cleanly;
/// the second phase walks the same extended sequence. Circular loops of odd
/// length are extended only for the second phase. Open loops never move their
/// last vertex. A phase without points is dropped.
pub fn decompose<I: MeshIndex>(loops: &[Loop<I>]) -> Vec<Phase<I>> {
    let mut phases = Vec::new();

    for lp in loops {
        if lp.is_empty() {
            continue;
        }
        let even = lp.len() % 2 == 0;
        // (extend before phase 0, extend before phase 1, [knot start, point start] per phase)
        let (extend, starts) = match (lp.circular, even) {
            (true, false) => ([false, true], [(0, 1), (0, 1)]),
            (true, true) => ([true, false], [(0, 1), (1, 2)]),
            (false, _) => ([false, false], [(0, 1), (1, 2)]),
        };

        let mut walk = lp.vertices.clone();
        for (phase, &(knot_start, point_start)) in starts.iter().enumerate() {
            if extend[phase] {
                let (first, last) = (walk[0], walk[walk.len() - 1]);
                walk.insert(0, last);
                walk.push(first);
            }
            let last = walk[walk.len() - 1];

            let mut knots: Vec<VertexId<I>> =
                walk.iter().skip(knot_start).step_by(2).copied().collect();

            let mut points: Vec<VertexId<I>> = Vec::new();
            for &v in walk.iter().skip(point_start).step_by(2) {
                if !lp.circular && v == last {
                    continue;
                }
                // The seam vertex shows up again after wrapping
                if points.first() == Some(&v) {
                    continue;
                }
                points.push(v);
            }

            if lp.circular && knots.first() != knots.last() {
                knots.push(knots[0]);
            }
            if !points.is_empty() {
                phases.push(Phase { knots, points });
            }
        }
    }

    phases
}

/// Curve parameters of a phase's knots and points.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    /// Parameter of each knot, non-decreasing.
    pub knots: Vec<f64>,

    /// Parameter of each point.
    pub points: Vec<f64>,
}

/// Assign arc-length parameters to the knots and points of a phase.
///
/// Each knot and point gets the cumulative Euclidean distance from the first
/// knot along the interleaved walk. With `regular`, every point is instead
/// placed midway between the parameters of its two bracketing knots.
///
/// # Example
///
/// ```
/// use looprelax::algo::knots::{parameterize, Phase};
/// use looprelax::mesh::{build_with_edges, PolyMesh, VertexId};
/// use nalgebra::Point3;
///
/// let vertices: Vec<Point3<f64>> = [0.0, 1.0, 4.0]
///     .iter()
///     .map(|&x| Point3::new(x, 0.0, 0.0))
///     .collect();
/// let faces: Vec<Vec<usize>> = Vec::new();
/// let mesh: PolyMesh = build_with_edges(&vertices, &faces, &[[0, 1], [1, 2]]).unwrap();
///
/// let phase = Phase {
///     knots: vec![VertexId::new(0), VertexId::new(2)],
///     points: vec![VertexId::new(1)],
/// };
/// assert_eq!(parameterize(&mesh, &phase, false).points, vec![1.0]);
/// assert_eq!(parameterize(&mesh, &phase, true).points, vec![2.0]);
/// ```
pub fn parameterize<I: MeshIndex>(mesh: &PolyMesh<I>, phase: &Phase<I>, regular: bool) -> Parameters {
    let mut knots = Vec::with_capacity(phase.knots.len());
    let mut points = Vec::with_capacity(phase.points.len());

    let mut total = 0.0;
    let mut previous: Option<Point3<f64>> = None;
    for (is_knot, v) in phase.interleaved() {
        let position = mesh.position(v);
        if let Some(prev) = previous {
            total += (position - prev).norm();
        }
        previous = Some(*position);
        if is_knot {
            knots.push(total);
        } else {
            points.push(total);
        }
    }

    if regular {
        for (p, t) in points.iter_mut().enumerate() {
            if let (Some(&lo), Some(&hi)) = (knots.get(p), knots.get(p + 1)) {
                *t = (lo + hi) / 2.0;
            }
        }
    }

    Parameters { knots, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_with_edges;

    fn ids(raw: &[usize]) -> Vec<VertexId> {
        raw.iter().map(|&i| VertexId::new(i)).collect()
    }

    fn phase(knots: &[usize], points: &[usize]) -> Phase {
        Phase {
            knots: ids(knots),
            points: ids(points),
        }
    }

    #[test]
    fn test_open_odd() {
        let lp = Loop::new(ids(&[0, 1, 2, 3, 4]), false);
        let phases = decompose(&[lp]);

        assert_eq!(phases, vec![phase(&[0, 2, 4], &[1, 3]), phase(&[1, 3], &[2])]);
    }

    #[test]
    fn test_open_even() {
        let lp = Loop::new(ids(&[0, 1, 2, 3]), false);
        let phases = decompose(&[lp]);

        assert_eq!(phases, vec![phase(&[0, 2], &[1]), phase(&[1, 3], &[2])]);
    }

    #[test]
    fn test_open_three_has_single_phase() {
        let lp = Loop::new(ids(&[0, 1, 2]), false);
        assert_eq!(decompose(&[lp]), vec![phase(&[0, 2], &[1])]);
    }

    #[test]
    fn test_circular_even() {
        let lp = Loop::new(ids(&[0, 1, 2, 3, 4, 5]), true);
        let phases = decompose(&[lp]);

        assert_eq!(
            phases,
            vec![phase(&[5, 1, 3, 5], &[0, 2, 4]), phase(&[0, 2, 4, 0], &[1, 3, 5])]
        );
        assert!(phases.iter().all(Phase::is_closed));
    }

    #[test]
    fn test_circular_odd() {
        let lp = Loop::new(ids(&[0, 1, 2, 3, 4]), true);
        let phases = decompose(&[lp]);

        assert_eq!(
            phases,
            vec![phase(&[0, 2, 4, 0], &[1, 3]), phase(&[4, 1, 3, 0, 4], &[0, 2, 4])]
        );
    }

    #[test]
    fn test_every_interior_vertex_is_a_point() {
        let lp = Loop::new(ids(&[0, 1, 2, 3, 4, 5, 6]), false);
        let phases = decompose(&[lp]);
        let mut moved: Vec<VertexId> = phases.iter().flat_map(|p| p.points.clone()).collect();
        moved.sort();

        assert_eq!(moved, ids(&[1, 2, 3, 4, 5]));
    }

    fn line(xs: &[f64]) -> PolyMesh {
        let vertices: Vec<Point3<f64>> = xs.iter().map(|&x| Point3::new(x, 0.0, 0.0)).collect();
        let edges: Vec<[usize; 2]> = (1..xs.len()).map(|i| [i - 1, i]).collect();
        let faces: Vec<Vec<usize>> = Vec::new();
        build_with_edges(&vertices, &faces, &edges).unwrap()
    }

    #[test]
    fn test_arc_length() {
        let mesh = line(&[0.0, 1.0, 4.0, 4.5, 10.0]);
        let params = parameterize(&mesh, &phase(&[0, 2, 4], &[1, 3]), false);

        assert_eq!(params.knots, vec![0.0, 4.0, 10.0]);
        assert_eq!(params.points, vec![1.0, 4.5]);
    }

    #[test]
    fn test_arc_length_off_axis() {
        // 3-4-5 and 2-3-6 steps: chord lengths 5 and 7
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 4.0, 0.0),
            Point3::new(5.0, 7.0, 6.0),
        ];
        let faces: Vec<Vec<usize>> = Vec::new();
        let mesh: PolyMesh = build_with_edges(&vertices, &faces, &[[0, 1], [1, 2]]).unwrap();
        let params = parameterize(&mesh, &phase(&[0, 2], &[1]), false);

        assert!((params.knots[1] - 12.0).abs() < 1e-12);
        assert!((params.points[0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_regular_midpoints() {
        let mesh = line(&[0.0, 1.0, 4.0, 4.5, 10.0]);
        let params = parameterize(&mesh, &phase(&[0, 2, 4], &[1, 3]), true);

        assert_eq!(params.knots, vec![0.0, 4.0, 10.0]);
        assert_eq!(params.points, vec![2.0, 7.0]);
    }

    #[test]
    fn test_closed_ring_parameters() {
        // Unit square walked 0 -> 1 -> 2 -> 3 -> 0
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: PolyMesh = build_with_edges(&vertices, &[[0usize, 1, 2, 3]], &[]).unwrap();
        let params = parameterize(&mesh, &phase(&[0, 2, 0], &[1, 3]), false);

        assert_eq!(params.knots, vec![0.0, 2.0, 4.0]);
        assert_eq!(params.points, vec![1.0, 3.0]);
    }
}
