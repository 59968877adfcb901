//! Nearest-value search.

use crate::error::ProcessError;

/// Index of the element closest to `value`.
///
/// Ties resolve to the lowest index. NaN distances never win; if every distance
/// is NaN (e.g. `value` is NaN), index `0` is returned.
pub fn find_nearest_index(data: &[f64], value: f64) -> Result<usize, ProcessError> {
    if data.is_empty() {
        return Err(ProcessError::EmptyInput);
    }

    let mut best_idx = 0;
    let mut best_dist = f64::NAN;
    for (i, &x) in data.iter().enumerate() {
        let d = (x - value).abs();
        if d.is_nan() {
            continue;
        }
        // Strict `<` keeps the first of equal distances.
        if best_dist.is_nan() || d < best_dist {
            best_idx = i;
            best_dist = d;
        }
    }
    Ok(best_idx)
}
