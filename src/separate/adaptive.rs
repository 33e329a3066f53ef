//! Adaptive strategy: a repeating period per frame.
//!
//! A beat spectrogram gives every frame its own period estimate, and the
//! repeating model becomes a median filter whose taps follow that local
//! period. Tracks the period through gradual tempo changes that would smear
//! a single global estimate.

use super::{analyze_channels, mask_and_resynthesize, mean_power};
use crate::analysis::periodicity::{beat_spectrogram, repeating_periods};
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
    let power = mean_power(&spectra.mags);
    let beat_gram = beat_spectrogram(&power, plan.segment_frames);
    let periods = repeating_periods(&beat_gram, plan.period_lags)?;
    debug!(
        "adaptive separation: {} per-frame periods, filter order {}",
        periods.len(),
        plan.filter_order
    );

    let structure = RepeatingStructure::PerFrame {
        periods,
        filter_order: plan.filter_order,
    };
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
