//! Window functions for short-time spectral analysis.
//!
//! Windows are generated in periodic (DFT-even) form: the cosine argument
//! runs over `2*pi*i / size` rather than `2*pi*i / (size - 1)`. At 50%
//! overlap a periodic window sums to a constant across hops, which is what
//! the overlap-add resynthesis in [`crate::core::stft`] relies on.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Hamming window coefficients.
const HAMMING_A0: f64 = 0.54;
const HAMMING_A1: f64 = 0.46;

/// Window function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowType {
    Hamming,
    Hann,
}

/// Generates a window function of the specified type and size.
pub fn generate_window(window_type: WindowType, size: usize) -> Vec<f32> {
    match window_type {
        WindowType::Hamming => hamming_window(size),
        WindowType::Hann => hann_window(size),
    }
}

/// Returns `Some(trivial_window)` for degenerate sizes (0 or 1), or `None`
/// to indicate the caller should compute the full window.
#[inline]
fn trivial_window(size: usize) -> Option<Vec<f32>> {
    match size {
        0 => Some(vec![]),
        1 => Some(vec![1.0]),
        _ => None,
    }
}

/// Generates a periodic Hamming window.
#[inline]
fn hamming_window(size: usize) -> Vec<f32> {
    if let Some(w) = trivial_window(size) {
        return w;
    }
    let n = size as f64;
    (0..size)
        .map(|i| {
            let x = (2.0 * PI * i as f64) / n;
            (HAMMING_A0 - HAMMING_A1 * x.cos()) as f32
        })
        .collect()
}

/// Generates a periodic Hann window.
#[inline]
fn hann_window(size: usize) -> Vec<f32> {
    if let Some(w) = trivial_window(size) {
        return w;
    }
    let n = size as f64;
    (0..size)
        .map(|i| {
            let x = (2.0 * PI * i as f64) / n;
            (0.5 * (1.0 - x.cos())) as f32
        })
        .collect()
}

/// Sum of window samples taken every `step` positions starting at zero.
///
/// For a periodic window at an overlap where the constant-overlap-add
/// property holds, this is the gain the overlap-added resynthesis must be
/// divided by.
pub fn overlap_sum(window: &[f32], step: usize) -> f32 {
    window
        .iter()
        .step_by(step.max(1))
        .map(|&w| w as f64)
        .sum::<f64>() as f32
}

/// Linear cross-fade ramps for joining adjacent segments.
///
/// Returns `(fade_in, fade_out)`, each `overlap` samples long. The ramps are
/// the two halves of a triangular window of length `2 * overlap`; rising plus
/// falling equals exactly 1 at every position.
pub fn crossfade_ramps(overlap: usize) -> (Vec<f32>, Vec<f32>) {
    let fade_in: Vec<f32> = (0..overlap)
        .map(|i| (i as f32 + 0.5) / overlap as f32)
        .collect();
    let fade_out: Vec<f32> = fade_in.iter().map(|&v| 1.0 - v).collect();
    (fade_in, fade_out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamming_window_properties() {
        let w = hamming_window(1024);
        assert_eq!(w.len(), 1024);
        // Periodic form: first sample is the 0.08 floor, midpoint is the peak
        assert!((w[0] - 0.08).abs() < 1e-6);
        assert!((w[512] - 1.0).abs() < 1e-6);
        // Periodic symmetry: w[i] == w[size - i]
        for i in 1..512 {
            assert!((w[i] - w[1024 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_hann_window_properties() {
        let w = hann_window(1024);
        assert_eq!(w.len(), 1024);
        assert!(w[0].abs() < 1e-6);
        assert!((w[512] - 1.0).abs() < 1e-6);
        for i in 1..512 {
            assert!((w[i] - w[1024 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_overlap_sum_is_constant_at_half_overlap() {
        // Periodic windows at 50% overlap sum to the same constant at every
        // offset, and for Hamming that constant is 2 * 0.54 = 1.08.
        for &(window_type, expected) in &[(WindowType::Hamming, 1.08f64), (WindowType::Hann, 1.0)]
        {
            let size = 512;
            let step = size / 2;
            let w = generate_window(window_type, size);
            for offset in 0..step {
                let sum: f64 = w.iter().skip(offset).step_by(step).map(|&v| v as f64).sum();
                assert!(
                    (sum - expected).abs() < 1e-5,
                    "offset {}: sum {} != {}",
                    offset,
                    sum,
                    expected
                );
            }
            assert!((overlap_sum(&w, step) as f64 - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_empty_window() {
        assert!(hamming_window(0).is_empty());
        assert!(hann_window(0).is_empty());
    }

    #[test]
    fn test_single_sample_window() {
        assert_eq!(hamming_window(1), vec![1.0]);
        assert_eq!(hann_window(1), vec![1.0]);
    }

    #[test]
    fn test_generate_window_dispatch() {
        let h = generate_window(WindowType::Hamming, 256);
        assert_eq!(h.len(), 256);
        let hn = generate_window(WindowType::Hann, 256);
        assert_eq!(hn.len(), 256);
    }

    #[test]
    fn test_crossfade_ramps_sum_to_one() {
        let (fade_in, fade_out) = crossfade_ramps(64);
        assert_eq!(fade_in.len(), 64);
        assert_eq!(fade_out.len(), 64);
        for i in 0..64 {
            assert!((fade_in[i] + fade_out[i] - 1.0).abs() < 1e-6);
        }
        // Monotone and strictly inside (0, 1): no dead samples at the joins
        assert!(fade_in[0] > 0.0 && fade_in[63] < 1.0);
        for i in 1..64 {
            assert!(fade_in[i] > fade_in[i - 1]);
        }
    }

    #[test]
    fn test_crossfade_ramps_empty_overlap() {
        let (fade_in, fade_out) = crossfade_ramps(0);
        assert!(fade_in.is_empty());
        assert!(fade_out.is_empty());
    }
}
