//! Polynomial fits.
//!
//! Fitting a polynomial is a *linear* least-squares problem, so no iterative
//! solver or initial guess is needed:
//!
//! ```text
//! A[i, k] = x_i^(order - k)      (Vandermonde, highest power first)
//! coefs   = argmin ‖A c - y‖²
//! ```

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::ProcessError;
use crate::fit::stats::r_squared;
use crate::math::solve_least_squares;

/// Polynomial fit result.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyFit {
    pub order: usize,
    /// Coefficients, highest power first (`coefs.len() == order + 1`).
    pub coefs: Vec<f64>,
    /// The polynomial evaluated at the fitted `x`.
    pub fitted: Vec<f64>,
    pub r_squared: f64,
}

impl PolyFit {
    /// Evaluate the polynomial at `x` (Horner's scheme).
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefs.iter().fold(0.0, |acc, c| acc * x + c)
    }
}

/// Least-squares polynomial of degree `order` through `(x, y)`.
///
/// Needs at least `order + 1` points.
pub fn poly_fit(x: &[f64], y: &[f64], order: usize) -> Result<PolyFit, ProcessError> {
    if x.is_empty() {
        return Err(ProcessError::EmptyInput);
    }
    if x.len() != y.len() {
        return Err(ProcessError::LengthMismatch {
            expected: x.len(),
            found: y.len(),
        });
    }
    let n_coef = order + 1;
    if x.len() < n_coef {
        return Err(ProcessError::InvalidArgument(format!(
            "order {order} polynomial needs at least {n_coef} points, got {}",
            x.len()
        )));
    }

    let a = DMatrix::from_fn(x.len(), n_coef, |i, k| x[i].powi((order - k) as i32));
    let b = DVector::from_column_slice(y);
    let coefs = solve_least_squares(&a, &b).ok_or_else(|| {
        ProcessError::InvalidArgument("polynomial design matrix is ill-conditioned or not finite".to_string())
    })?;

    let mut fit = PolyFit {
        order,
        coefs: coefs.iter().copied().collect(),
        fitted: Vec::new(),
        r_squared: f64::NAN,
    };
    fit.fitted = x.iter().map(|&v| fit.evaluate(v)).collect();
    fit.r_squared = r_squared(y, &fit.fitted)?;
    debug!(order, coefs = ?fit.coefs, r_squared = fit.r_squared, "polynomial fit");

    Ok(fit)
}
