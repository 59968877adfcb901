//! Array utilities over plain `f64` sequences and parallel array sets.
//!
//! A "parallel array set" is a list of equal-length sequences that share one
//! index ordering (for example voltage/current/phase columns). Functions that
//! take one validate the shared length and report `LengthMismatch` otherwise.

pub mod order;
pub mod outliers;
pub mod resample;
pub mod search;

pub use order::*;
pub use outliers::*;
pub use resample::*;
pub use search::*;

use crate::error::ProcessError;

/// Check that every array in `arrays` has the same length and return it.
pub(crate) fn common_len(arrays: &[Vec<f64>]) -> Result<usize, ProcessError> {
    let Some(first) = arrays.first() else {
        return Err(ProcessError::EmptyInput);
    };
    let expected = first.len();
    for a in &arrays[1..] {
        if a.len() != expected {
            return Err(ProcessError::LengthMismatch {
                expected,
                found: a.len(),
            });
        }
    }
    Ok(expected)
}
