//! Soft time-frequency masks from repeating structure.
//!
//! Every strategy reduces to the same masking rule. For each time-frequency
//! cell, a repeating model is taken as the median of the magnitudes at the
//! frames the structure designates as repetitions. The model is clamped by
//! the observed magnitude (the repeating part cannot exceed what is there),
//! and the mask is the ratio of repeating to observed, guarded so silence
//! passes through as background instead of dividing to NaN.

use crate::core::fft::{COMPLEX_ZERO, MASK_EPSILON};
use rustfft::num_complex::Complex;

/// How the repeating model picks related frames for each time frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RepeatingStructure {
    /// One period, in frames, shared by the whole spectrogram.
    Global(usize),
    /// A period per frame, smoothed with a centered odd-order median filter.
    PerFrame {
        periods: Vec<usize>,
        filter_order: usize,
    },
    /// Explicit repeating-neighbor sets per frame, from similarity analysis.
    Neighbors(Vec<Vec<usize>>),
}

/// Builds the soft background mask for one channel's half-band magnitude
/// spectrogram (frame-major).
///
/// Masks are in `[0, 1]`: 1 keeps a cell entirely in the background, 0 sends
/// it entirely to the foreground.
pub fn build_mask(mags: &[Vec<f32>], structure: &RepeatingStructure) -> Vec<Vec<f32>> {
    match structure {
        RepeatingStructure::Global(period) => global_mask(mags, *period),
        RepeatingStructure::PerFrame {
            periods,
            filter_order,
        } => per_frame_mask(mags, periods, *filter_order),
        RepeatingStructure::Neighbors(sets) => neighbor_mask(mags, sets),
    }
}

/// Forces mask bins below `cutoff_bin` (excluding DC) to pass the background
/// through unchanged. The complementary foreground loses those bins, which
/// keeps bass lines and kick drums out of the extracted foreground.
pub fn apply_high_pass(mask: &mut [Vec<f32>], cutoff_bin: usize) {
    for frame in mask.iter_mut() {
        let end = cutoff_bin.min(frame.len());
        for value in frame.iter_mut().take(end).skip(1) {
            *value = 1.0;
        }
    }
}

/// Multiplies one full-length complex frame by a half-band mask row,
/// mirroring the masked half onto the conjugate bins so the inverse FFT
/// stays real.
pub(crate) fn apply_mask_frame(frame: &[Complex<f32>], row: &[f32]) -> Vec<Complex<f32>> {
    let size = frame.len();
    let num_bins = size / 2 + 1;
    let mut out = vec![COMPLEX_ZERO; size];
    for bin in 0..num_bins.min(row.len()) {
        out[bin] = frame[bin] * row[bin];
        if bin > 0 && bin < num_bins - 1 {
            out[size - bin] = out[bin].conj();
        }
    }
    out
}

/// Masks every frame of a spectrogram. Frames beyond the mask are dropped.
pub(crate) fn apply_mask_frames(
    frames: &[Vec<Complex<f32>>],
    mask: &[Vec<f32>],
) -> Vec<Vec<Complex<f32>>> {
    frames
        .iter()
        .zip(mask.iter())
        .map(|(frame, row)| apply_mask_frame(frame, row))
        .collect()
}

/// Median of a scratch slice, sorted in place. Even counts average the two
/// middle values.
pub(crate) fn median_in_place(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}

/// Mask value for one cell: repeating model clamped by the observation,
/// over the observation.
pub(crate) fn soft_ratio(model: f32, observed: f32) -> f32 {
    let repeating = model.min(observed);
    (repeating + MASK_EPSILON) / (observed + MASK_EPSILON)
}

fn global_mask(mags: &[Vec<f32>], period: usize) -> Vec<Vec<f32>> {
    let num_frames = mags.len();
    if num_frames == 0 {
        return vec![];
    }
    let num_bins = mags[0].len();
    let period = period.max(1);
    let mut mask = vec![vec![0.0f32; num_bins]; num_frames];
    let mut scratch: Vec<f32> = Vec::new();
    // Frames an exact period apart share one model value per bin; the final
    // partial segment contributes only where it has data.
    for offset in 0..period.min(num_frames) {
        let taps: Vec<usize> = (offset..num_frames).step_by(period).collect();
        for bin in 0..num_bins {
            scratch.clear();
            scratch.extend(taps.iter().map(|&t| mags[t][bin]));
            let model = median_in_place(&mut scratch);
            for &t in &taps {
                mask[t][bin] = soft_ratio(model, mags[t][bin]);
            }
        }
    }
    mask
}

fn per_frame_mask(mags: &[Vec<f32>], periods: &[usize], filter_order: usize) -> Vec<Vec<f32>> {
    let num_frames = mags.len();
    if num_frames == 0 {
        return vec![];
    }
    let num_bins = mags[0].len();
    let half = (filter_order / 2) as isize;
    let mut mask = vec![vec![0.0f32; num_bins]; num_frames];
    let mut scratch: Vec<f32> = Vec::with_capacity(filter_order);
    for t in 0..num_frames {
        let period = periods.get(t).copied().unwrap_or(1).max(1) as isize;
        // Taps a period apart, centered on this frame, clamped to the edges
        let taps: Vec<usize> = (-half..=half)
            .map(|k| (t as isize + k * period).clamp(0, num_frames as isize - 1) as usize)
            .collect();
        for bin in 0..num_bins {
            scratch.clear();
            scratch.extend(taps.iter().map(|&tap| mags[tap][bin]));
            let model = median_in_place(&mut scratch);
            mask[t][bin] = soft_ratio(model, mags[t][bin]);
        }
    }
    mask
}

fn neighbor_mask(mags: &[Vec<f32>], sets: &[Vec<usize>]) -> Vec<Vec<f32>> {
    let num_frames = mags.len();
    if num_frames == 0 {
        return vec![];
    }
    let num_bins = mags[0].len();
    let mut mask = vec![vec![0.0f32; num_bins]; num_frames];
    let mut scratch: Vec<f32> = Vec::new();
    for t in 0..num_frames {
        let own = [t];
        let taps: &[usize] = match sets.get(t) {
            // A frame with no repeating neighbors models itself: pass-through
            Some(set) if !set.is_empty() => set.as_slice(),
            _ => &own,
        };
        for bin in 0..num_bins {
            scratch.clear();
            scratch.extend(
                taps.iter()
                    .filter(|&&tap| tap < num_frames)
                    .map(|&tap| mags[tap][bin]),
            );
            if scratch.is_empty() {
                scratch.push(mags[t][bin]);
            }
            let model = median_in_place(&mut scratch);
            mask[t][bin] = soft_ratio(model, mags[t][bin]);
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periodic_mags(num_frames: usize, period: usize) -> Vec<Vec<f32>> {
        (0..num_frames)
            .map(|t| {
                let phase = t % period;
                vec![
                    1.0 + phase as f32,
                    2.0 * (phase as f32 + 0.5),
                    0.3,
                ]
            })
            .collect()
    }

    #[test]
    fn test_median_odd_and_even() {
        let mut odd = [3.0f32, 1.0, 2.0];
        assert_eq!(median_in_place(&mut odd), 2.0);
        let mut even = [4.0f32, 1.0, 3.0, 2.0];
        assert_eq!(median_in_place(&mut even), 2.5);
        let mut empty: [f32; 0] = [];
        assert_eq!(median_in_place(&mut empty), 0.0);
    }

    #[test]
    fn test_global_mask_is_unity_for_perfectly_periodic_input() {
        let mags = periodic_mags(12, 3);
        let mask = build_mask(&mags, &RepeatingStructure::Global(3));
        for row in &mask {
            for &v in row {
                assert!((v - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_global_mask_suppresses_outlier() {
        let mut mags = periodic_mags(8, 2);
        mags[5][0] = 100.0;
        let mask = build_mask(&mags, &RepeatingStructure::Global(2));
        // The burst cell gets pushed toward the foreground
        assert!(mask[5][0] < 0.1, "mask {}", mask[5][0]);
        // Its periodic siblings stay in the background
        assert!((mask[1][0] - 1.0).abs() < 1e-4);
        assert!((mask[3][0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_global_mask_exact_even_median() {
        // Two segments per offset: the model is the average of the pair
        let mags = vec![vec![2.0f32], vec![8.0], vec![2.0], vec![100.0]];
        let mask = build_mask(&mags, &RepeatingStructure::Global(2));
        assert!((mask[0][0] - 1.0).abs() < 1e-6);
        assert!((mask[1][0] - 1.0).abs() < 1e-6);
        // model = (8 + 100) / 2 = 54, clamped by 100: mask = 54 / 100
        assert!((mask[3][0] - 0.54).abs() < 1e-3);
    }

    #[test]
    fn test_mask_bounded_and_silence_passes_through() {
        let mut mags = periodic_mags(16, 4);
        mags[7] = vec![0.0, 0.0, 0.0];
        let mask = build_mask(&mags, &RepeatingStructure::Global(4));
        for row in &mask {
            for &v in row {
                assert!((0.0..=1.0 + 1e-6).contains(&v), "mask {}", v);
            }
        }
        // All-silent cells resolve to pass-through, not NaN
        for &v in &mask[7] {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_per_frame_mask_matches_global_on_constant_period() {
        let mags = periodic_mags(20, 4);
        let global = build_mask(&mags, &RepeatingStructure::Global(4));
        let adaptive = build_mask(
            &mags,
            &RepeatingStructure::PerFrame {
                periods: vec![4; 20],
                filter_order: 3,
            },
        );
        // Perfectly periodic input: both models equal the observation
        for (g_row, a_row) in global.iter().zip(adaptive.iter()) {
            for (&g, &a) in g_row.iter().zip(a_row.iter()) {
                assert!((g - a).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_per_frame_mask_clamps_taps_at_edges() {
        let mags = vec![vec![1.0f32]; 6];
        let mask = build_mask(
            &mags,
            &RepeatingStructure::PerFrame {
                periods: vec![4; 6],
                filter_order: 5,
            },
        );
        // Frame 0's taps all clamp into range; constant input stays unity
        for row in &mask {
            assert!((row[0] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_neighbor_mask_uses_given_sets() {
        let mags = vec![vec![2.0f32], vec![2.0], vec![10.0], vec![2.0]];
        let sets = vec![vec![0, 1, 3], vec![0, 1, 3], vec![0, 1, 3], vec![0, 1, 3]];
        let mask = build_mask(&mags, &RepeatingStructure::Neighbors(sets));
        // Frame 2's model comes from its quiet neighbors: 2 / 10
        assert!((mask[2][0] - 0.2).abs() < 1e-3);
        assert!((mask[0][0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_neighbor_mask_empty_set_falls_back_to_self() {
        let mags = vec![vec![5.0f32], vec![7.0]];
        let mask = build_mask(&mags, &RepeatingStructure::Neighbors(vec![vec![], vec![]]));
        assert!((mask[0][0] - 1.0).abs() < 1e-6);
        assert!((mask[1][0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_apply_high_pass_forces_low_bins() {
        let mut mask = vec![vec![0.25f32; 6]; 2];
        apply_high_pass(&mut mask, 3);
        for row in &mask {
            assert_eq!(row[0], 0.25);
            assert_eq!(row[1], 1.0);
            assert_eq!(row[2], 1.0);
            assert_eq!(row[3], 0.25);
            assert_eq!(row[5], 0.25);
        }
    }

    #[test]
    fn test_apply_high_pass_zero_cutoff_is_noop() {
        let mut mask = vec![vec![0.5f32; 4]];
        apply_high_pass(&mut mask, 0);
        assert!(mask[0].iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_apply_mask_frame_conjugate_symmetry() {
        let size = 8;
        let frame: Vec<Complex<f32>> = (0..size)
            .map(|i| Complex::new(i as f32 + 1.0, (i as f32 - 3.0) * 0.5))
            .collect();
        let row = vec![0.5f32; size / 2 + 1];
        let masked = apply_mask_frame(&frame, &row);
        for bin in 1..size / 2 {
            let mirror = masked[size - bin];
            assert!((masked[bin].conj() - mirror).norm() < 1e-6);
        }
        // DC and Nyquist are scaled in place
        assert!((masked[0] - frame[0] * 0.5).norm() < 1e-6);
        assert!((masked[4] - frame[4] * 0.5).norm() < 1e-6);
    }
}
