//! Offline separation strategies.
//!
//! Every strategy walks the same pipeline: transform each channel, derive a
//! repeating structure from the channel-mean spectrogram, build a soft mask
//! per channel, then resynthesize the masked spectra as the background. The
//! modules here differ only in how the repeating structure is found.

pub(crate) mod adaptive;
pub(crate) mod fixed;
pub(crate) mod segmented;
pub(crate) mod sim;

use crate::core::stft::{half_magnitudes, Stft};
use crate::core::types::Sample;
use crate::mask::apply_mask_frames;
use rustfft::num_complex::Complex;

/// Per-channel spectra of one signal: full complex frames and half-band
/// magnitudes, kept side by side so masking does not recompute them.
pub(crate) struct ChannelSpectra {
    pub frames: Vec<Vec<Vec<Complex<f32>>>>,
    pub mags: Vec<Vec<Vec<f32>>>,
}

pub(crate) fn analyze_channels(channels: &[Vec<Sample>], stft: &Stft) -> ChannelSpectra {
    let mut frames = Vec::with_capacity(channels.len());
    let mut mags = Vec::with_capacity(channels.len());
    for channel in channels {
        let channel_frames = stft.forward(channel);
        mags.push(half_magnitudes(&channel_frames));
        frames.push(channel_frames);
    }
    ChannelSpectra { frames, mags }
}

/// Mean magnitude across channels, per time-frequency cell.
pub(crate) fn mean_magnitude(channel_mags: &[Vec<Vec<f32>>]) -> Vec<Vec<f32>> {
    let num_channels = channel_mags.len();
    if num_channels == 0 {
        return vec![];
    }
    let num_frames = channel_mags[0].len();
    (0..num_frames)
        .map(|t| {
            let num_bins = channel_mags[0][t].len();
            (0..num_bins)
                .map(|b| {
                    let sum: f64 = channel_mags.iter().map(|ch| ch[t][b] as f64).sum();
                    (sum / num_channels as f64) as f32
                })
                .collect()
        })
        .collect()
}

/// Channel-mean magnitude spectrogram, squared: the power input the
/// periodicity analyzers expect.
pub(crate) fn mean_power(channel_mags: &[Vec<Vec<f32>>]) -> Vec<Vec<f32>> {
    let mut mean = mean_magnitude(channel_mags);
    for frame in mean.iter_mut() {
        for value in frame.iter_mut() {
            *value *= *value;
        }
    }
    mean
}

/// Applies a mask to one channel's frames and resynthesizes the background,
/// trimmed to the channel's original length.
pub(crate) fn mask_and_resynthesize(
    stft: &Stft,
    frames: &[Vec<Complex<f32>>],
    mask: &[Vec<f32>],
    num_samples: usize,
) -> Vec<Sample> {
    let masked = apply_mask_frames(frames, mask);
    let mut signal = stft.inverse(&masked);
    signal.truncate(num_samples);
    signal
}
