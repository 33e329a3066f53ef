//! Error types for the repet crate.

use std::fmt;

/// Errors that can occur during separation.
#[derive(Debug, Clone, PartialEq)]
pub enum SeparationError {
    /// Sample rate must be positive.
    InvalidSampleRate(u32),
    /// Channel count must be at least 1.
    InvalidChannels(u16),
    /// Window duration must be positive and finite.
    InvalidWindowDuration(f64),
    /// High-pass cutoff must be non-negative and finite.
    InvalidCutoff(f64),
    /// Period search range must have positive, ordered bounds.
    InvalidPeriodRange { low: f64, high: f64 },
    /// Segment length and step must be positive, with step <= length.
    InvalidSegmentation { length: f64, step: f64 },
    /// Median filter order must be odd and at least 1.
    InvalidFilterOrder(usize),
    /// Similarity threshold must lie in [0, 1].
    InvalidSimilarityThreshold(f32),
    /// Similarity distance must be non-negative and finite.
    InvalidSimilarityDistance(f64),
    /// Similarity neighbor cap must be at least 1.
    InvalidSimilarityCount(usize),
    /// Streaming buffer duration must be positive and finite.
    InvalidBufferDuration(f64),
    /// The period range, converted to frames, does not intersect the
    /// searchable lags of the beat spectrum.
    PeriodRangeOutsideSpectrum {
        low: usize,
        high: usize,
        max_lag: usize,
    },
    /// Input contained no samples.
    EmptyInput,
    /// Interleaved sample count does not match the channel layout.
    ChannelMismatch { channels: u16, samples: usize },
    /// Input contained NaN or infinite samples.
    NonFiniteInput,
    /// A streaming chunk arrived out of order.
    OutOfOrderChunk { expected: usize, received: usize },
}

impl fmt::Display for SeparationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeparationError::InvalidSampleRate(sr) => {
                write!(f, "invalid sample rate: {}, must be positive", sr)
            }
            SeparationError::InvalidChannels(ch) => {
                write!(f, "invalid channel count: {}, must be at least 1", ch)
            }
            SeparationError::InvalidWindowDuration(d) => {
                write!(
                    f,
                    "invalid window duration: {} s, must be positive and finite",
                    d
                )
            }
            SeparationError::InvalidCutoff(hz) => {
                write!(
                    f,
                    "invalid high-pass cutoff: {} Hz, must be non-negative and finite",
                    hz
                )
            }
            SeparationError::InvalidPeriodRange { low, high } => {
                write!(
                    f,
                    "invalid period range: [{}, {}] s, bounds must be positive with low <= high",
                    low, high
                )
            }
            SeparationError::InvalidSegmentation { length, step } => {
                write!(
                    f,
                    "invalid segmentation: length {} s, step {} s, both must be positive with step <= length",
                    length, step
                )
            }
            SeparationError::InvalidFilterOrder(order) => {
                write!(f, "invalid filter order: {}, must be odd", order)
            }
            SeparationError::InvalidSimilarityThreshold(t) => {
                write!(f, "invalid similarity threshold: {}, must be in [0, 1]", t)
            }
            SeparationError::InvalidSimilarityDistance(d) => {
                write!(
                    f,
                    "invalid similarity distance: {} s, must be non-negative and finite",
                    d
                )
            }
            SeparationError::InvalidSimilarityCount(count) => {
                write!(
                    f,
                    "invalid similarity count: {}, must be at least 1",
                    count
                )
            }
            SeparationError::InvalidBufferDuration(d) => {
                write!(
                    f,
                    "invalid buffer duration: {} s, must be positive and finite",
                    d
                )
            }
            SeparationError::PeriodRangeOutsideSpectrum { low, high, max_lag } => {
                write!(
                    f,
                    "period range [{}, {}] frames does not intersect searchable lags 1..={}",
                    low, high, max_lag
                )
            }
            SeparationError::EmptyInput => write!(f, "empty input"),
            SeparationError::ChannelMismatch { channels, samples } => {
                write!(
                    f,
                    "interleaved sample count {} does not match channel count {}",
                    samples, channels
                )
            }
            SeparationError::NonFiniteInput => {
                write!(f, "input contains NaN or infinite samples")
            }
            SeparationError::OutOfOrderChunk { expected, received } => {
                write!(
                    f,
                    "out-of-order chunk: expected start sample {}, received {}",
                    expected, received
                )
            }
        }
    }
}

impl std::error::Error for SeparationError {}
