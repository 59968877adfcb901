//! Linear least squares solver.
//!
//! Two callers in this crate solve small dense problems of the form:
//!
//! ```text
//! minimize ‖A x - b‖²
//! ```
//!
//! - the polynomial fit (Vandermonde design matrix, one solve per fit)
//! - each damped Levenberg-Marquardt step (augmented Jacobian, one solve per iteration)
//!
//! Implementation choices:
//! - SVD handles tall systems (more rows than columns) and rank deficiency.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Parameter counts are tiny (a handful of columns), so SVD cost is irrelevant.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if a.nrows() != b.len() || a.ncols() == 0 {
        return None;
    }
    if a.iter().any(|v| !v.is_finite()) || b.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let svd = a.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(x) = svd.solve(b, tol) {
            if x.iter().all(|v| v.is_finite()) {
                return Some(x);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let x = solve_least_squares(&a, &b).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-10);
        assert!((x[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_rejects_shape_mismatch_and_nan() {
        let a = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        assert!(solve_least_squares(&a, &DVector::from_row_slice(&[1.0])).is_none());
        assert!(solve_least_squares(&a, &DVector::from_row_slice(&[1.0, f64::NAN])).is_none());
    }
}
