//! Down-sampling by nearest match and up-sampling by linear interpolation.

use crate::arrays::{common_len, find_nearest_index};
use crate::error::ProcessError;

/// Pick, for each value of `target_x`, the row of `source` whose
/// `source[x_index]` entry is nearest, and gather that row from every array.
///
/// Every returned array has `target_x.len()` entries.
pub fn downsample(target_x: &[f64], source: &[Vec<f64>], x_index: usize) -> Result<Vec<Vec<f64>>, ProcessError> {
    common_len(source)?;
    let Some(source_x) = source.get(x_index) else {
        return Err(ProcessError::InvalidArgument(format!(
            "x index {x_index} out of range for {} arrays",
            source.len()
        )));
    };

    let indices = target_x
        .iter()
        .map(|&x| find_nearest_index(source_x, x))
        .collect::<Result<Vec<usize>, _>>()?;

    Ok(source
        .iter()
        .map(|a| indices.iter().map(|&i| a[i]).collect())
        .collect())
}

/// Linearly interpolate `source_y` (sampled at `source_x`) onto `target_x`.
///
/// Targets outside `[source_x[0], source_x[last]]` clamp to the boundary value.
/// `source_x` must be non-decreasing; the first violating index is reported as
/// `NonMonotonicDomain`. NaN targets produce NaN.
pub fn upsample(target_x: &[f64], source_x: &[f64], source_y: &[f64]) -> Result<Vec<f64>, ProcessError> {
    if source_x.is_empty() {
        return Err(ProcessError::EmptyInput);
    }
    if source_x.len() != source_y.len() {
        return Err(ProcessError::LengthMismatch {
            expected: source_x.len(),
            found: source_y.len(),
        });
    }
    ensure_non_decreasing(source_x)?;

    Ok(target_x
        .iter()
        .map(|&x| interp_one(x, source_x, source_y))
        .collect())
}

fn ensure_non_decreasing(xs: &[f64]) -> Result<(), ProcessError> {
    if let Some(idx) = xs.iter().position(|x| x.is_nan()) {
        return Err(ProcessError::NonMonotonicDomain { index: idx });
    }
    for i in 1..xs.len() {
        if xs[i] < xs[i - 1] {
            return Err(ProcessError::NonMonotonicDomain { index: i });
        }
    }
    Ok(())
}

fn interp_one(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let last = xp.len() - 1;
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }

    // First index with xp > x; in 1..=last because xp[0] < x < xp[last].
    let j = xp.partition_point(|&v| v <= x);
    let i = j - 1;
    let slope = (fp[j] - fp[i]) / (xp[j] - xp[i]);
    fp[i] + slope * (x - xp[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsample_interpolates_linearly() {
        let y = upsample(&[0.0, 0.5, 1.0], &[0.0, 1.0], &[0.0, 10.0]).unwrap();
        assert_eq!(y, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn upsample_clamps_outside_domain() {
        let y = upsample(&[-3.0, 1.5, 9.0], &[0.0, 1.0, 2.0], &[1.0, 3.0, 2.0]).unwrap();
        assert_eq!(y, vec![1.0, 2.5, 2.0]);
    }

    #[test]
    fn upsample_handles_repeated_x() {
        let y = upsample(&[1.0, 1.5], &[0.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 5.0, 7.0]).unwrap();
        assert!((y[1] - 6.0).abs() < 1e-12);
        assert!(y[0].is_finite());
    }

    #[test]
    fn upsample_rejects_decreasing_domain() {
        assert_eq!(
            upsample(&[0.5], &[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]),
            Err(ProcessError::NonMonotonicDomain { index: 2 })
        );
        assert_eq!(upsample(&[0.5], &[], &[]), Err(ProcessError::EmptyInput));
    }

    #[test]
    fn downsample_gathers_nearest_rows() {
        let x = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let y = vec![0.0, 10.0, 20.0, 30.0, 40.0];
        let out = downsample(&[0.9, 3.6], &[x, y], 0).unwrap();
        assert_eq!(out, vec![vec![1.0, 4.0], vec![10.0, 40.0]]);
    }

    #[test]
    fn downsample_uses_x_index() {
        let a = vec![5.0, 6.0, 7.0];
        let x = vec![0.0, 0.5, 1.0];
        let out = downsample(&[0.45, 0.0, 2.0], &[a, x], 1).unwrap();
        assert_eq!(out[0], vec![6.0, 5.0, 7.0]);
        assert_eq!(out[1].len(), 3);
    }
}
