//! Similarity strategy: repeating frames found by spectral similarity.
//!
//! Instead of assuming the background repeats on a period, each frame looks
//! up the frames most similar to it anywhere in the signal and takes those
//! as its repetitions. Handles backgrounds that recur irregularly, like a
//! riff that comes back at uneven intervals.

use super::{analyze_channels, mask_and_resynthesize, mean_magnitude};
use crate::analysis::similarity::{neighbor_indices, self_similarity};
use crate::core::stft::Stft;
use crate::core::types::{FramePlan, Sample};
use crate::error::SeparationError;
use crate::mask::{apply_high_pass, build_mask, RepeatingStructure};
use log::debug;

pub(crate) fn background(
    channels: &[Vec<Sample>],
    plan: &FramePlan,
) -> Result<Vec<Vec<Sample>>, SeparationError> {
    let stft = Stft::new(plan.window.clone(), plan.step);
    let spectra = analyze_channels(channels, &stft);
    let mean = mean_magnitude(&spectra.mags);
    let matrix = self_similarity(&mean);
    let neighbors: Vec<Vec<usize>> = matrix
        .iter()
        .map(|row| {
            neighbor_indices(
                row,
                plan.similarity_threshold,
                plan.similarity_spacing,
                plan.similarity_count,
            )
        })
        .collect();
    if !neighbors.is_empty() {
        let total: usize = neighbors.iter().map(|set| set.len()).sum();
        debug!(
            "similarity separation: {} frames, {:.1} neighbors per frame",
            neighbors.len(),
            total as f64 / neighbors.len() as f64
        );
    }

    let structure = RepeatingStructure::Neighbors(neighbors);
    let mut backgrounds = Vec::with_capacity(channels.len());
    for (idx, channel) in channels.iter().enumerate() {
        let mut mask = build_mask(&spectra.mags[idx], &structure);
        apply_high_pass(&mut mask, plan.cutoff_bin);
        backgrounds.push(mask_and_resynthesize(
            &stft,
            &spectra.frames[idx],
            &mask,
            channel.len(),
        ));
    }
    Ok(backgrounds)
}
