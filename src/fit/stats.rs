//! Goodness of fit.

use crate::error::ProcessError;
use crate::math::mean;

/// Coefficient of determination: `1 - SS_res / SS_tot`.
///
/// `SS_res = Σ (predicted - observed)²`, `SS_tot = Σ (observed - mean)²`.
/// Constant observed data (`SS_tot == 0`) has no variance to explain and is
/// reported as `DegenerateFit` instead of a NaN/inf ratio.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> Result<f64, ProcessError> {
    if observed.len() != predicted.len() {
        return Err(ProcessError::LengthMismatch {
            expected: observed.len(),
            found: predicted.len(),
        });
    }
    let mu = mean(observed).ok_or(ProcessError::EmptyInput)?;

    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, f)| (f - y) * (f - y))
        .sum();
    let ss_tot: f64 = observed.iter().map(|y| (y - mu) * (y - mu)).sum();

    if ss_tot == 0.0 {
        return Err(ProcessError::DegenerateFit);
    }
    Ok(1.0 - ss_res / ss_tot)
}
