//! NaN detection.

use tracing::debug;

/// Number of NaN entries in `data`.
pub fn count_nan(data: &[f64]) -> usize {
    data.iter().filter(|x| x.is_nan()).count()
}

/// `true` if `data` contains at least one NaN.
pub fn has_nan(data: &[f64]) -> bool {
    let count = count_nan(data);
    debug!(count, "NaN scan");
    count > 0
}
