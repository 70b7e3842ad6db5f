//! Spline fitting through loop knots.
//!
//! Two interpolation schemes are provided:
//!
//! - **Cubic**: a natural cubic spline per coordinate axis, solved with a
//!   tridiagonal sweep. Closed knot rings are padded with four wrapped knots
//!   on each side before solving so the curve stays smooth across the seam.
//! - **Linear**: straight segments between consecutive knots.
//!
//! Degenerate input never fails: zero parameter spans and zero pivots are
//! replaced by [`EPSILON`].
//!
//! # Example
//!
//! ```
//! use looprelax::algo::spline::Spline;
//! use nalgebra::Point3;
//!
//! let knots = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//! ];
//! let params = vec![0.0, 1.5, 3.0];
//!
//! let spline = Spline::cubic(&knots, &params, false).unwrap();
//! assert_eq!(spline.num_segments(), 2);
//! assert!((spline.evaluate(1.5) - knots[1]).norm() < 1e-9);
//! ```

use nalgebra::{Point3, Vector3};

use crate::mesh::{MeshIndex, PolyMesh, VertexId};

/// Substitute for zero parameter spans and zero pivots.
pub const EPSILON: f64 = 1e-8;

/// Number of wrapped knots added on each side of a closed ring.
const PERIODIC_PADDING: usize = 4;

/// Interpolation scheme used to fit a spline through the knots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    /// Natural cubic spline; smooth results.
    #[default]
    Cubic,
    /// Piecewise linear; simple and fast.
    Linear,
}

/// One cubic piece: per axis `a + b*dt + c*dt^2 + d*dt^3` with `dt = m - t0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    /// `[a, b, c, d]` for the x, y, and z axes.
    pub coefficients: [[f64; 4]; 3],

    /// Parameter at the start of the segment.
    pub t0: f64,
}

impl CubicSegment {
    /// Evaluate the segment at parameter `m`.
    pub fn evaluate(&self, m: f64) -> Point3<f64> {
        let dt = m - self.t0;
        let axis = |[a, b, c, d]: [f64; 4]| a + b * dt + c * dt * dt + d * dt * dt * dt;
        Point3::new(
            axis(self.coefficients[0]),
            axis(self.coefficients[1]),
            axis(self.coefficients[2]),
        )
    }
}

/// One linear piece between two consecutive knots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSegment {
    /// Position of the first knot.
    pub start: Point3<f64>,

    /// Offset from the first to the second knot.
    pub delta: Vector3<f64>,

    /// Parameter of the first knot.
    pub t0: f64,

    /// Parameter difference between the two knots.
    pub span: f64,
}

impl LinearSegment {
    /// Evaluate the segment at parameter `m`.
    pub fn evaluate(&self, m: f64) -> Point3<f64> {
        let span = if self.span == 0.0 { EPSILON } else { self.span };
        self.start + self.delta * ((m - self.t0) / span)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segments {
    Cubic(Vec<CubicSegment>),
    Linear(Vec<LinearSegment>),
}

/// A piecewise curve through a sequence of knots.
#[derive(Debug, Clone, PartialEq)]
pub struct Spline {
    params: Vec<f64>,
    segments: Segments,
}

impl Spline {
    /// Fit a spline through mesh vertices.
    ///
    /// A knot sequence whose first and last ids coincide is treated as a
    /// closed ring. Returns `None` with fewer than two knots or when the
    /// parameter count does not match.
    pub fn fit<I: MeshIndex>(
        interpolation: Interpolation,
        mesh: &PolyMesh<I>,
        knots: &[VertexId<I>],
        params: &[f64],
    ) -> Option<Self> {
        let positions: Vec<Point3<f64>> = knots.iter().map(|&v| *mesh.position(v)).collect();
        match interpolation {
            Interpolation::Cubic => {
                let closed = knots.len() > 1 && knots.first() == knots.last();
                Self::cubic(&positions, params, closed)
            }
            Interpolation::Linear => Self::linear(&positions, params),
        }
    }

    /// Fit a natural cubic spline.
    ///
    /// With `closed`, the first and last knot are expected to be the same
    /// point; wrapped knots are added on both ends while solving and removed
    /// again afterwards, so the result always has `knots.len() - 1` segments.
    pub fn cubic(knots: &[Point3<f64>], params: &[f64], closed: bool) -> Option<Self> {
        let n = knots.len();
        if n < 2 || params.len() != n {
            return None;
        }

        let (positions, x, offset) = if closed {
            let (positions, x) = pad_periodic(knots, params);
            (positions, x, PERIODIC_PADDING)
        } else {
            (knots.to_vec(), params.to_vec(), 0)
        };

        let per_axis: Vec<Vec<[f64; 4]>> = (0..3)
            .map(|axis| {
                let a: Vec<f64> = positions.iter().map(|p| p[axis]).collect();
                natural_cubic(&x, &a)
            })
            .collect();

        let segments = (offset..offset + n - 1)
            .map(|i| CubicSegment {
                coefficients: [per_axis[0][i], per_axis[1][i], per_axis[2][i]],
                t0: x[i],
            })
            .collect();

        Some(Self {
            params: params.to_vec(),
            segments: Segments::Cubic(segments),
        })
    }

    /// Fit straight segments between consecutive knots.
    pub fn linear(knots: &[Point3<f64>], params: &[f64]) -> Option<Self> {
        if knots.len() < 2 || params.len() != knots.len() {
            return None;
        }
        let segments = knots
            .windows(2)
            .zip(params.windows(2))
            .map(|(k, t)| LinearSegment {
                start: k[0],
                delta: k[1] - k[0],
                t0: t[0],
                span: t[1] - t[0],
            })
            .collect();

        Some(Self {
            params: params.to_vec(),
            segments: Segments::Linear(segments),
        })
    }

    /// Number of segments.
    pub fn num_segments(&self) -> usize {
        match &self.segments {
            Segments::Cubic(s) => s.len(),
            Segments::Linear(s) => s.len(),
        }
    }

    /// Knot parameters the spline was fitted on.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Index of the segment that evaluates parameter `m`.
    ///
    /// A parameter equal to a knot's selects the segment starting at the first
    /// such knot; any other parameter selects the segment starting at the last
    /// knot below it. The result is clamped to the valid segment range.
    pub fn segment_index(&self, m: f64) -> usize {
        let last = self.num_segments().saturating_sub(1);
        let index = match self.params.iter().position(|&t| t == m) {
            Some(exact) => exact,
            None => {
                let below = self.params.iter().filter(|&&t| t < m).count();
                below.saturating_sub(1)
            }
        };
        index.min(last)
    }

    /// Evaluate the spline at parameter `m`.
    pub fn evaluate(&self, m: f64) -> Point3<f64> {
        let i = self.segment_index(m);
        match &self.segments {
            Segments::Cubic(s) => s[i].evaluate(m),
            Segments::Linear(s) => s[i].evaluate(m),
        }
    }
}

/// Wrap four knots (and extrapolated parameters) around each end of a closed ring.
fn pad_periodic(knots: &[Point3<f64>], params: &[f64]) -> (Vec<Point3<f64>>, Vec<f64>) {
    let n = knots.len() as isize;
    let at = |i: isize| i.rem_euclid(n) as usize;

    let mut positions = Vec::with_capacity(knots.len() + 2 * PERIODIC_PADDING);
    let mut x = Vec::with_capacity(params.len() + 2 * PERIODIC_PADDING);

    // Leading side, walking backwards from the seam
    let mut total = 0.0;
    let mut lead_x = Vec::with_capacity(PERIODIC_PADDING);
    let mut lead_p = Vec::with_capacity(PERIODIC_PADDING);
    for k in 1..=PERIODIC_PADDING as isize {
        lead_p.push(knots[at(-k - 1)]);
        total += params[at(-k)] - params[at(-k - 1)];
        lead_x.push(params[0] - total);
    }
    positions.extend(lead_p.iter().rev());
    x.extend(lead_x.iter().rev());

    positions.extend_from_slice(knots);
    x.extend_from_slice(params);

    // Trailing side, walking forwards from the seam
    let mut total = 0.0;
    let last = params[params.len() - 1];
    for k in 0..PERIODIC_PADDING as isize {
        positions.push(knots[at(k + 1)]);
        total += params[at(k + 1)] - params[at(k)];
        x.push(last + total);
    }

    (positions, x)
}

/// Solve one axis of a natural cubic spline; returns `[a, b, c, d]` per segment.
fn natural_cubic(x: &[f64], a: &[f64]) -> Vec<[f64; 4]> {
    let n = x.len();

    let h: Vec<f64> = x
        .windows(2)
        .map(|w| {
            let span = w[1] - w[0];
            if span == 0.0 {
                EPSILON
            } else {
                span
            }
        })
        .collect();

    let mut q = vec![0.0; n];
    for i in 1..n - 1 {
        q[i] = 3.0 / h[i] * (a[i + 1] - a[i]) - 3.0 / h[i - 1] * (a[i] - a[i - 1]);
    }

    // Forward sweep
    let mut u = vec![0.0; n];
    let mut z = vec![0.0; n];
    for i in 1..n - 1 {
        let mut l = 2.0 * (x[i + 1] - x[i - 1]) - h[i - 1] * u[i - 1];
        if l == 0.0 {
            l = EPSILON;
        }
        u[i] = h[i] / l;
        z[i] = (q[i] - h[i - 1] * z[i - 1]) / l;
    }

    // Back substitution
    let mut c = vec![0.0; n];
    let mut segments = vec![[0.0; 4]; n - 1];
    for i in (0..n - 1).rev() {
        c[i] = z[i] - u[i] * c[i + 1];
        let b = (a[i + 1] - a[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0;
        let d = (c[i + 1] - c[i]) / (3.0 * h[i]);
        segments[i] = [a[i], b, c[i], d];
    }
    segments
}
