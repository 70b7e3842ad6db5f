//! Best-fit plane through a set of points.
//!
//! The normal is the direction of least variance: the dominant eigenvector of
//! the inverted covariance matrix, found by power iteration. Singular
//! covariance (all points on a line or in an axis-aligned plane) falls back to
//! the coordinate axis with the smallest absolute covariance row sum.

use nalgebra::{Matrix3, Point3, Vector3};

const MAX_ITERATIONS: usize = 500;

/// A plane through `center` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Centroid of the fitted points.
    pub center: Point3<f64>,

    /// Unit normal.
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Unsigned distance of a point from the plane.
    pub fn distance(&self, p: &Point3<f64>) -> f64 {
        (p - self.center).dot(&self.normal).abs()
    }
}

/// Fit a plane through points.
///
/// Returns `None` for an empty slice.
///
/// # Example
///
/// ```
/// use looprelax::algo::plane::best_fit_plane;
/// use nalgebra::Point3;
///
/// let points = vec![
///     Point3::new(0.0, 0.0, 1.0),
///     Point3::new(1.0, 0.0, 1.1),
///     Point3::new(1.0, 1.0, 0.9),
///     Point3::new(0.0, 1.0, 1.0),
/// ];
/// let plane = best_fit_plane(&points).unwrap();
/// assert!(plane.normal.z.abs() > 0.9);
/// ```
pub fn best_fit_plane(points: &[Point3<f64>]) -> Option<Plane> {
    if points.is_empty() {
        return None;
    }

    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    let center = Point3::from(sum / points.len() as f64);

    let mut covariance = Matrix3::zeros();
    for p in points {
        let d = p - center;
        covariance += d * d.transpose();
    }

    let normal = match cofactor_inverse(&covariance) {
        Some(inverse) => power_iteration(&inverse),
        None => smallest_row_axis(&covariance),
    };

    Some(Plane { center, normal })
}

/// Inverse through the adjugate; `None` when the determinant is exactly zero.
fn cofactor_inverse(m: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    let det = m.determinant();
    if det == 0.0 {
        return None;
    }
    let adjugate = Matrix3::new(
        m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
        m[(0, 2)] * m[(2, 1)] - m[(0, 1)] * m[(2, 2)],
        m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
        m[(1, 2)] * m[(2, 0)] - m[(1, 0)] * m[(2, 2)],
        m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
        m[(0, 2)] * m[(1, 0)] - m[(0, 0)] * m[(1, 2)],
        m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        m[(0, 1)] * m[(2, 0)] - m[(0, 0)] * m[(2, 1)],
        m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
    );
    Some(adjugate / det)
}

fn power_iteration(m: &Matrix3<f64>) -> Vector3<f64> {
    let mut v = Vector3::new(1.0, 1.0, 1.0);
    for _ in 0..MAX_ITERATIONS {
        let mut next = m * v;
        let length = next.norm();
        if length != 0.0 {
            next /= length;
        }
        if next == v {
            break;
        }
        v = next;
    }
    // A collapsed iteration yields the unit diagonal rather than (1, 1, 1)
    v.try_normalize(0.0)
        .unwrap_or_else(|| Vector3::new(1.0, 1.0, 1.0).normalize())
}

fn smallest_row_axis(m: &Matrix3<f64>) -> Vector3<f64> {
    let sums: Vec<f64> = (0..3).map(|r| m.row(r).sum().abs()).collect();
    let axis = if sums[0] < sums[1] {
        if sums[0] < sums[2] {
            0
        } else {
            2
        }
    } else if sums[1] < sums[2] {
        1
    } else {
        2
    };
    let mut normal = Vector3::zeros();
    normal[axis] = 1.0;
    normal
}
