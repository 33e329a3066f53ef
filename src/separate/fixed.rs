//! Fixed-period strategy: one repeating period for the whole signal.

use super::{analyze_channels, mask_and_resynthesize, mean_power};
use crate::analysis::periodicity::{beat_spectrum, repeating_period};
use crate::core::stft::Stft;
use crate::core::types::{FramePlan, Sample};
use crate::error::SeparationError;
use crate::mask::{apply_high_pass, build_mask, RepeatingStructure};
use log::debug;

/// Extracts the repeating background of each channel.
///
/// The period is estimated once, from the beat spectrum of the channel-mean
/// power spectrogram, and every channel is masked against it.
pub(crate) fn background(
    channels: &[Vec<Sample>],
    plan: &FramePlan,
) -> Result<Vec<Vec<Sample>>, SeparationError> {
    let stft = Stft::new(plan.window.clone(), plan.step);
    let spectra = analyze_channels(channels, &stft);
    let power = mean_power(&spectra.mags);
    let beat = beat_spectrum(&power);
    let period = repeating_period(&beat, plan.period_lags)?;
    debug!(
        "fixed-period separation: period {} of {} frames",
        period,
        power.len()
    );

    let structure = RepeatingStructure::Global(period);
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
