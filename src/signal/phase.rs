//! Phase wrapping and unwrapping (radians).

use std::f64::consts::{FRAC_PI_4, PI, TAU};

/// Wrap every element into `[-π, π)`.
///
/// Each value is shifted by `-π`, reduced modulo `2π` with `floor`, then shifted
/// back: `y = x - π; out = y - (floor(y / 2π) + 1)·2π + π`. The result differs
/// from the input by a whole number of turns. Non-finite values stay non-finite.
pub fn wrap_phase(data: &[f64]) -> Vec<f64> {
    data.iter()
        .map(|&x| {
            let y = x - PI;
            let turns = (y / TAU).floor();
            y - (turns + 1.0) * TAU + PI
        })
        .collect()
}

/// Undo wrapping by tracking jumps across the `±π` seam.
///
/// Walking consecutive pairs `(a, b)`:
/// - `a > π/4` and `b < -π/4` counts as a downward wrap: offset `+= 2π`
/// - `a < -π/4` and `b > π/4` counts as an upward wrap: offset `-= 2π`
///
/// The running offset is added to every element after the first; the first
/// element is returned unchanged.
///
/// Precondition: the true (unwrapped) step between samples stays below `π/2`.
/// Larger steps are misread as wraps and silently produce a wrong result.
pub fn unwrap_phase(data: &[f64]) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(data.len());
    out.push(first);

    let mut offset = 0.0;
    for pair in data.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a > FRAC_PI_4 && b < -FRAC_PI_4 {
            offset += TAU;
        } else if a < -FRAC_PI_4 && b > FRAC_PI_4 {
            offset -= TAU;
        }
        out.push(b + offset);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_values_lie_in_half_open_interval() {
        let data: Vec<f64> = (-200..=200).map(|i| i as f64 * 0.173).collect();
        let wrapped = wrap_phase(&data);
        assert_eq!(wrapped.len(), data.len());
        for (x, w) in data.iter().zip(&wrapped) {
            assert!((-PI..PI).contains(w), "{x} -> {w}");
            let turns = (x - w) / TAU;
            assert!((turns - turns.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn wrap_includes_last_element() {
        let wrapped = wrap_phase(&[0.5, 7.0]);
        assert!((wrapped[1] - (7.0 - TAU)).abs() < 1e-12);
    }

    #[test]
    fn wrap_boundaries() {
        let w = wrap_phase(&[PI, -PI, 0.0]);
        assert!((w[0] + PI).abs() < 1e-12);
        assert!((w[1] + PI).abs() < 1e-12);
        assert!(w[2].abs() < 1e-12);
    }

    #[test]
    fn unwrap_recovers_monotonic_phase() {
        // True phase ramps up by 0.3 rad per sample, well under π/2.
        let truth: Vec<f64> = (0..80).map(|i| 0.1 + 0.3 * i as f64).collect();
        let wrapped = wrap_phase(&truth);
        let unwrapped = unwrap_phase(&wrapped);

        assert_eq!(unwrapped[0], wrapped[0]);
        for i in 1..truth.len() {
            let d_true = truth[i] - truth[i - 1];
            let d = unwrapped[i] - unwrapped[i - 1];
            assert!((d - d_true).abs() < 1e-9, "step {i}: {d} vs {d_true}");
        }
        // Re-wrapping gives back the wrapped input.
        for (a, b) in wrap_phase(&unwrapped).iter().zip(&wrapped) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn unwrap_handles_decreasing_phase() {
        let truth: Vec<f64> = (0..50).map(|i| -0.2 * i as f64).collect();
        let unwrapped = unwrap_phase(&wrap_phase(&truth));
        for i in 0..truth.len() {
            assert!((unwrapped[i] - truth[i]).abs() < 1e-9, "{i}");
        }
    }

    #[test]
    fn unwrap_empty_and_single() {
        assert!(unwrap_phase(&[]).is_empty());
        assert_eq!(unwrap_phase(&[2.0]), vec![2.0]);
    }
}
