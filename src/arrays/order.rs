//! Reordering and reshaping of parallel array sets.

use std::cmp::Ordering;

use crate::arrays::common_len;
use crate::error::ProcessError;

/// Sort every array in `arrays` by the ascending order of `arrays[sort_index]`.
///
/// The sort is stable, so equal keys keep their original relative order. NaN
/// keys sort last.
///
/// Example: sorting `[v, i, phi]` with `sort_index = 1` orders all three by
/// ascending `i`.
pub fn sort_parallel_arrays(arrays: &[Vec<f64>], sort_index: usize) -> Result<Vec<Vec<f64>>, ProcessError> {
    common_len(arrays)?;
    let Some(keys) = arrays.get(sort_index) else {
        return Err(ProcessError::InvalidArgument(format!(
            "sort index {sort_index} out of range for {} arrays",
            arrays.len()
        )));
    };

    let mut perm: Vec<usize> = (0..keys.len()).collect();
    perm.sort_by(|&a, &b| cmp_nan_last(keys[a], keys[b]));

    Ok(arrays
        .iter()
        .map(|a| perm.iter().map(|&i| a[i]).collect())
        .collect())
}

fn cmp_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Concatenate a list of arrays into one flat array.
pub fn linearize(arrays: &[Vec<f64>]) -> Vec<f64> {
    arrays.iter().flatten().copied().collect()
}

/// Transpose an equal-length list of arrays into rows.
///
/// `[[10, 10], [15, 15], [2, 2]]` becomes `[[10, 15, 2], [10, 15, 2]]`.
pub fn columns_to_rows(arrays: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ProcessError> {
    let n = common_len(arrays)?;
    Ok((0..n)
        .map(|i| arrays.iter().map(|a| a[i]).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_all_arrays_by_key() {
        let sorted = sort_parallel_arrays(&[vec![3.0, 1.0, 2.0], vec![30.0, 10.0, 20.0]], 0).unwrap();
        assert_eq!(sorted, vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]]);
    }

    #[test]
    fn sort_is_stable_and_nan_last() {
        let keys = vec![2.0, f64::NAN, 1.0, 2.0, 1.0];
        let tags = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let sorted = sort_parallel_arrays(&[tags, keys], 1).unwrap();
        assert_eq!(sorted[0], vec![2.0, 4.0, 0.0, 3.0, 1.0]);
        assert!(sorted[1][4].is_nan());
    }

    #[test]
    fn sort_rejects_bad_input() {
        assert_eq!(
            sort_parallel_arrays(&[vec![1.0, 2.0], vec![1.0]], 0),
            Err(ProcessError::LengthMismatch { expected: 2, found: 1 })
        );
        assert!(matches!(
            sort_parallel_arrays(&[vec![1.0]], 3),
            Err(ProcessError::InvalidArgument(_))
        ));
        assert_eq!(sort_parallel_arrays(&[], 0), Err(ProcessError::EmptyInput));
    }

    #[test]
    fn linearize_and_transpose() {
        let data = vec![vec![10.0, 10.0], vec![15.0, 15.0], vec![2.0, 2.0]];
        assert_eq!(linearize(&data), vec![10.0, 10.0, 15.0, 15.0, 2.0, 2.0]);
        assert_eq!(
            columns_to_rows(&data).unwrap(),
            vec![vec![10.0, 15.0, 2.0], vec![10.0, 15.0, 2.0]]
        );
    }
}
