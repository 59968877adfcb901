//! Sigma-based outlier rejection.

use tracing::debug;

use crate::math::{mean, population_std};

/// Default number of standard deviations kept by [`reject_outliers`].
pub const DEFAULT_OUTLIER_M: f64 = 2.0;

/// Keep the elements with `|x - mean| < m * std`, in their original order.
///
/// Mean and standard deviation are population statistics over the whole input.
/// The comparison is strict, so constant data with a finite `m` comes back
/// empty (`std = 0`). An infinite `m` returns the input unchanged.
pub fn reject_outliers(data: &[f64], m: f64) -> Vec<f64> {
    if m == f64::INFINITY {
        return data.to_vec();
    }
    let (Some(mu), Some(sd)) = (mean(data), population_std(data)) else {
        return Vec::new();
    };

    let cutoff = m * sd;
    let kept: Vec<f64> = data
        .iter()
        .copied()
        .filter(|x| (x - mu).abs() < cutoff)
        .collect();

    debug!(
        n_in = data.len(),
        n_kept = kept.len(),
        mean = mu,
        std = sd,
        "rejected outliers"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_far_values_and_keeps_order() {
        let data = [1.0, 2.0, 1.5, 100.0, 2.5, 1.0, 2.0, 1.5, 2.0, 1.0];
        let kept = reject_outliers(&data, DEFAULT_OUTLIER_M);
        assert_eq!(kept, vec![1.0, 2.0, 1.5, 2.5, 1.0, 2.0, 1.5, 2.0, 1.0]);
    }

    #[test]
    fn result_is_subsequence() {
        let data = [3.0, -2.0, 0.5, 8.0, 0.1, -0.3, 0.2];
        let kept = reject_outliers(&data, 1.0);
        let mut it = data.iter();
        for k in &kept {
            assert!(it.any(|x| x == k), "{k} out of order");
        }
    }

    #[test]
    fn infinite_m_keeps_everything() {
        let data = [1.0, 1.0, 1.0];
        assert_eq!(reject_outliers(&data, f64::INFINITY), data.to_vec());
        let data = [1.0, -50.0, 3.0];
        assert_eq!(reject_outliers(&data, f64::INFINITY), data.to_vec());
    }

    #[test]
    fn constant_data_with_finite_m_is_emptied() {
        assert!(reject_outliers(&[4.0, 4.0, 4.0], 2.0).is_empty());
        assert!(reject_outliers(&[], 2.0).is_empty());
    }
}
