//! Box-car (moving average) smoothing.
//!
//! The window for sample `i` is `[i - c, i + c]` with `c = half_width`, so the
//! interior average spans `2c + 1` samples. Near the ends the window is clipped
//! to the data; [`EdgeMode`] decides what the clipped sum is divided by.

use serde::{Deserialize, Serialize};

/// Default half-width (`c = 25` averages over 51 samples).
pub const DEFAULT_HALF_WIDTH: usize = 25;

/// How clipped windows at the array ends are normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    /// Divide by the number of samples actually inside the clipped window.
    ///
    /// A constant signal is reproduced exactly everywhere.
    #[default]
    Clipped,
    /// Reproduce the historical divisors:
    ///
    /// - left edge (`i < c`): sum of `data[0 .. i+c]`, divided by `i + c`
    /// - right edge (`i > n - c`): sum of `data[i-c .. n]`, divided by `n - i + c + 1`
    /// - interior: sum of `data[i-c .. i+c+1]` (clipped at `n`), divided by `2c + 1`
    ///
    /// The right-edge divisor is one larger than the sample count, so values near
    /// the end are biased towards zero. Only useful to match old outputs.
    Legacy,
}

/// Smooth `data` with a centered moving average of half-width `half_width`.
///
/// `half_width = 0` returns a copy of the input.
pub fn boxcar_smooth(data: &[f64], half_width: usize, edges: EdgeMode) -> Vec<f64> {
    if half_width == 0 {
        return data.to_vec();
    }
    match edges {
        EdgeMode::Clipped => boxcar_clipped(data, half_width),
        EdgeMode::Legacy => boxcar_legacy(data, half_width),
    }
}

fn boxcar_clipped(data: &[f64], c: usize) -> Vec<f64> {
    let n = data.len();

    // Prefix sums keep this O(n) for wide windows.
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for &x in data {
        acc += x;
        prefix.push(acc);
    }

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(c);
            let hi = (i + c + 1).min(n);
            // Direct summation when NaNs are present so they stay local to
            // their windows (a prefix sum would poison every later window).
            let sum = if prefix[hi].is_finite() && prefix[lo].is_finite() {
                prefix[hi] - prefix[lo]
            } else {
                data[lo..hi].iter().sum()
            };
            sum / (hi - lo) as f64
        })
        .collect()
}

fn boxcar_legacy(data: &[f64], c: usize) -> Vec<f64> {
    let n = data.len();
    let sum = |lo: usize, hi: usize| -> f64 {
        let hi = hi.min(n);
        if lo >= hi { 0.0 } else { data[lo..hi].iter().sum() }
    };

    (0..n)
        .map(|i| {
            if i < c {
                sum(0, i + c) / (i + c) as f64
            } else if i + c > n {
                // i > n - c, written without unsigned underflow.
                sum(i - c, n) / (n + c + 1 - i) as f64
            } else {
                sum(i - c, i + c + 1) / (2 * c + 1) as f64
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_signal_is_preserved() {
        let data = vec![3.25; 40];
        for c in [1, 5, 25, 60] {
            let s = boxcar_smooth(&data, c, EdgeMode::Clipped);
            assert_eq!(s.len(), data.len());
            for v in s {
                assert!((v - 3.25).abs() < 1e-12, "c={c} got {v}");
            }
        }
    }

    #[test]
    fn clipped_windows_use_true_counts() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let s = boxcar_smooth(&data, 1, EdgeMode::Clipped);
        assert_eq!(s, vec![1.5, 2.0, 3.0, 4.0, 4.5]);
    }

    #[test]
    fn legacy_divisors_match_historical_output() {
        // n = 5, c = 2:
        //   i=0: sum(d[0..2]) / 2 = 1.5
        //   i=1: sum(d[0..3]) / 3 = 2.0
        //   i=2: sum(d[0..5]) / 5 = 3.0   (interior)
        //   i=3: sum(d[1..6] clipped to d[1..5]) / 5 = 2.8   (i == n - c is still interior)
        //   i=4: sum(d[2..5]) / 4 = 3.0
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let s = boxcar_smooth(&data, 2, EdgeMode::Legacy);
        let expected = [1.5, 2.0, 3.0, 2.8, 3.0];
        for (a, b) in s.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12, "{s:?}");
        }
    }

    #[test]
    fn nan_stays_local() {
        let mut data = vec![1.0; 10];
        data[2] = f64::NAN;
        let s = boxcar_smooth(&data, 1, EdgeMode::Clipped);
        assert!(s[1].is_nan() && s[2].is_nan() && s[3].is_nan());
        assert_eq!(s[0], 1.0);
        assert_eq!(s[9], 1.0);
    }

    #[test]
    fn zero_half_width_and_empty_input() {
        assert_eq!(boxcar_smooth(&[1.0, 2.0], 0, EdgeMode::Legacy), vec![1.0, 2.0]);
        assert!(boxcar_smooth(&[], 3, EdgeMode::Clipped).is_empty());
    }
}
