//! Summary statistics over plain `f64` slices.
//!
//! Standard deviations are population statistics (divide by `N`), which is what
//! outlier rejection expects.

use crate::error::ProcessError;

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation. `None` for an empty slice.
pub fn population_std(data: &[f64]) -> Option<f64> {
    let mu = mean(data)?;
    let var = data.iter().map(|x| (x - mu) * (x - mu)).sum::<f64>() / data.len() as f64;
    Some(var.sqrt())
}

/// Root mean square error of `data` against `targets`.
pub fn rmse(data: &[f64], targets: &[f64]) -> Result<f64, ProcessError> {
    if data.is_empty() {
        return Err(ProcessError::EmptyInput);
    }
    if data.len() != targets.len() {
        return Err(ProcessError::LengthMismatch {
            expected: data.len(),
            found: targets.len(),
        });
    }
    let sum_sq: f64 = data
        .iter()
        .zip(targets)
        .map(|(d, t)| (d - t) * (d - t))
        .sum();
    Ok((sum_sq / data.len() as f64).sqrt())
}

/// Root mean square (RMSE against zero).
pub fn rms(data: &[f64]) -> Result<f64, ProcessError> {
    if data.is_empty() {
        return Err(ProcessError::EmptyInput);
    }
    let sum_sq: f64 = data.iter().map(|d| d * d).sum();
    Ok((sum_sq / data.len() as f64).sqrt())
}
