#![forbid(unsafe_code)]
//! Pure Rust implementation of the REPET family of audio source separators.
//!
//! `repet` (REpeating Pattern Extraction Technique) splits a mixture into a
//! repeating background and a non-repeating foreground by finding periodic
//! structure in the magnitude spectrogram and masking everything that does
//! not repeat. Five strategies cover stationary loops, long recordings with
//! drifting tempo, and online processing of unbounded streams.
//!
//! # Quick Start
//!
//! ```
//! use repet::{SeparationParams, Strategy};
//!
//! // 3 seconds of 440 Hz sine at 8.192 kHz
//! let input: Vec<f32> = (0..3 * 8192)
//!     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 8192.0).sin())
//!     .collect();
//!
//! let params = SeparationParams::new(8192)
//!     .with_strategy(Strategy::FixedPeriod)
//!     .with_period_range(0.5, 2.0);
//!
//! let background = repet::separate(&input, &params).unwrap();
//! let foreground = repet::foreground(&input, &background);
//! assert_eq!(background.len(), input.len());
//! ```
//!
//! # Streaming
//!
//! For online use, feed audio in chunks via [`StreamingSeparator`]:
//!
//! ```
//! use repet::{SeparationParams, StreamingSeparator, Strategy};
//!
//! let params = SeparationParams::new(8192)
//!     .with_strategy(Strategy::StreamingSimilarity)
//!     .with_buffer_duration(2.0);
//!
//! let mut separator = StreamingSeparator::new(params).unwrap();
//! // separator.process(&chunk) for each incoming buffer
//! // separator.flush() once the stream ends
//! ```

pub mod analysis;
pub mod core;
pub mod error;
pub mod mask;
mod separate;
pub mod stream;

pub use crate::core::types::{AudioBuffer, Sample, SeparationParams, Strategy};
pub use crate::core::window::WindowType;
pub use crate::error::SeparationError;
pub use crate::stream::StreamingSeparator;

use crate::core::types::FramePlan;

/// Deinterleaves multi-channel audio into separate per-channel vectors.
#[inline]
fn deinterleave(input: &[f32], num_channels: usize) -> Vec<Vec<f32>> {
    (0..num_channels)
        .map(|ch| {
            input
                .iter()
                .skip(ch)
                .step_by(num_channels)
                .copied()
                .collect()
        })
        .collect()
}

/// Interleaves per-channel vectors into a single buffer, truncating to the shortest channel.
#[inline]
fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    let min_len = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    (0..min_len)
        .flat_map(|i| channels.iter().map(move |ch| ch[i]))
        .collect()
}

/// Validates the raw sample slice against the channel layout.
#[inline]
fn validate_input(input: &[Sample], params: &SeparationParams) -> Result<(), SeparationError> {
    if input.is_empty() {
        return Err(SeparationError::EmptyInput);
    }
    if input.len() % params.channels as usize != 0 {
        return Err(SeparationError::ChannelMismatch {
            channels: params.channels,
            samples: input.len(),
        });
    }
    if input.iter().any(|s| !s.is_finite()) {
        return Err(SeparationError::NonFiniteInput);
    }
    Ok(())
}

/// Deinterleaves, runs an offline strategy per channel, and re-interleaves.
fn offline(
    input: &[Sample],
    params: &SeparationParams,
    background_fn: impl FnOnce(&[Vec<Sample>], &FramePlan) -> Result<Vec<Vec<Sample>>, SeparationError>,
) -> Result<Vec<Sample>, SeparationError> {
    let channels = deinterleave(input, params.channels as usize);
    let plan = FramePlan::from_params(params);
    let backgrounds = background_fn(&channels, &plan)?;
    Ok(interleave(&backgrounds))
}

/// Extracts the repeating background from an interleaved mixture.
///
/// This is the main entry point for one-shot (offline) separation. The
/// strategy set in `params` decides how the repeating structure is found;
/// the returned background has exactly the same length and channel layout
/// as the input. Subtract it from the mixture (see [`foreground`]) to get
/// the non-repeating part.
///
/// # Errors
///
/// Returns a parameter validation error if `params` is inconsistent,
/// [`SeparationError::EmptyInput`] for an empty slice,
/// [`SeparationError::ChannelMismatch`] if the length does not divide by
/// the channel count, [`SeparationError::NonFiniteInput`] on NaN or
/// infinite samples, and [`SeparationError::PeriodRangeOutsideSpectrum`]
/// when a period-based strategy cannot fit the requested range into the
/// signal.
///
/// # Example
///
/// ```
/// use repet::{SeparationParams, Strategy};
///
/// let input: Vec<f32> = (0..2 * 8192)
///     .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 8192.0).sin())
///     .collect();
///
/// let params = SeparationParams::new(8192)
///     .with_strategy(Strategy::SelfSimilarity);
/// let background = repet::separate(&input, &params).unwrap();
/// assert_eq!(background.len(), input.len());
/// ```
pub fn separate(input: &[Sample], params: &SeparationParams) -> Result<Vec<Sample>, SeparationError> {
    params.validate()?;
    validate_input(input, params)?;

    match params.strategy {
        Strategy::FixedPeriod => offline(input, params, separate::fixed::background),
        Strategy::SegmentedPeriod => offline(input, params, separate::segmented::background),
        Strategy::AdaptivePeriod => offline(input, params, separate::adaptive::background),
        Strategy::SelfSimilarity => offline(input, params, separate::sim::background),
        Strategy::StreamingSimilarity => {
            let mut separator = StreamingSeparator::new(params.clone())?;
            let mut output = separator.process(input)?;
            output.extend(separator.flush()?);
            Ok(output)
        }
    }
}

/// Separates an [`AudioBuffer`] and returns the background as a new buffer.
///
/// The sample rate and channel layout are taken from the input buffer,
/// overriding whatever is set in `params`.
///
/// # Errors
///
/// Same conditions as [`separate`].
///
/// # Example
///
/// ```
/// use repet::{AudioBuffer, SeparationParams, Strategy};
///
/// let buffer = AudioBuffer::from_channels(
///     &[(0..2 * 8192)
///         .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 8192.0).sin())
///         .collect::<Vec<f32>>()],
///     8192,
/// )
/// .unwrap();
/// let params = SeparationParams::new(8192).with_strategy(Strategy::SelfSimilarity);
/// let background = repet::separate_buffer(&buffer, &params).unwrap();
/// assert_eq!(background.sample_rate, 8192);
/// ```
pub fn separate_buffer(
    buffer: &AudioBuffer,
    params: &SeparationParams,
) -> Result<AudioBuffer, SeparationError> {
    let mut effective_params = params.clone();
    effective_params.sample_rate = buffer.sample_rate;
    effective_params.channels = buffer.channels;

    let background = separate(&buffer.data, &effective_params)?;
    AudioBuffer::new(background, buffer.channels, buffer.sample_rate)
}

/// Returns the non-repeating foreground for a known background.
///
/// Separation is complementary in the time domain, so the foreground is
/// simply the mixture minus the background, sample by sample. The result
/// is truncated to the shorter of the two slices.
#[inline]
pub fn foreground(mixture: &[Sample], background: &[Sample]) -> Vec<Sample> {
    mixture
        .iter()
        .zip(background.iter())
        .map(|(&m, &b)| m - b)
        .collect()
}
