//! Core data types: audio buffers, separation strategies, and parameters.

use crate::core::window::{generate_window, WindowType};
use crate::error::SeparationError;
use serde::{Deserialize, Serialize};

/// A single audio sample (32-bit float, range -1.0 to 1.0).
pub type Sample = f32;

/// Upper bound on every duration-valued parameter, in seconds. Keeps the
/// frame counts and buffer capacities derived from a duration well inside
/// `usize`.
const MAX_DURATION_SECS: f64 = 600.0;

/// Buffer holding audio samples in interleaved format.
///
/// For mono audio, samples are stored sequentially: `[s0, s1, s2, ...]`
/// For stereo audio, samples are interleaved: `[L0, R0, L1, R1, ...]`
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Raw interleaved sample data.
    pub data: Vec<Sample>,
    /// Number of channels (1 = mono, 2 = stereo, ...).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new audio buffer.
    ///
    /// # Errors
    /// Returns `SeparationError::InvalidChannels` if channels is 0.
    /// Returns `SeparationError::InvalidSampleRate` if sample_rate is 0.
    pub fn new(data: Vec<Sample>, channels: u16, sample_rate: u32) -> Result<Self, SeparationError> {
        if channels == 0 {
            return Err(SeparationError::InvalidChannels(channels));
        }
        if sample_rate == 0 {
            return Err(SeparationError::InvalidSampleRate(sample_rate));
        }
        if data.len() % channels as usize != 0 {
            return Err(SeparationError::ChannelMismatch {
                channels,
                samples: data.len(),
            });
        }
        Ok(Self {
            data,
            channels,
            sample_rate,
        })
    }

    /// Number of frames in the buffer (total samples / channels).
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.data.len() / self.channels as usize
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Returns true if the buffer contains no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a single channel's data as a new vector.
    pub fn channel_data(&self, channel: u16) -> Vec<Sample> {
        if channel >= self.channels {
            return Vec::new();
        }
        let ch = channel as usize;
        let num_ch = self.channels as usize;
        self.data
            .iter()
            .skip(ch)
            .step_by(num_ch)
            .copied()
            .collect()
    }

    /// Create an `AudioBuffer` from separate channel vectors.
    ///
    /// # Errors
    /// Returns error if channels have different lengths or invalid parameters.
    pub fn from_channels(
        channels_data: &[Vec<Sample>],
        sample_rate: u32,
    ) -> Result<Self, SeparationError> {
        if channels_data.is_empty() {
            return Err(SeparationError::InvalidChannels(0));
        }
        let num_channels = channels_data.len() as u16;
        let num_frames = channels_data[0].len();
        for ch in channels_data {
            if ch.len() != num_frames {
                return Err(SeparationError::ChannelMismatch {
                    channels: num_channels,
                    samples: channels_data.iter().map(|c| c.len()).sum(),
                });
            }
        }
        let mut data = Vec::with_capacity(num_frames * num_channels as usize);
        for i in 0..num_frames {
            for ch in channels_data {
                data.push(ch[i]);
            }
        }
        AudioBuffer::new(data, num_channels, sample_rate)
    }
}

/// Which member of the algorithm family drives the separation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// One repeating period estimated for the whole signal.
    FixedPeriod,
    /// Independent fixed-period passes over overlapping time segments,
    /// cross-faded back together. Suits long signals whose period drifts.
    SegmentedPeriod,
    /// A repeating period per frame, from a sliding beat spectrogram.
    AdaptivePeriod,
    /// Repeating frames found by spectral similarity instead of a period,
    /// so repetitions do not need to be periodic.
    SelfSimilarity,
    /// Causal similarity search against a bounded history buffer.
    StreamingSimilarity,
}

/// Parameters controlling the separation.
///
/// Durations are in seconds and are converted to samples, frames, and bins
/// against `sample_rate` when processing starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationParams {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels (default: 1).
    pub channels: u16,
    /// Algorithm family member to run (default: `FixedPeriod`).
    pub strategy: Strategy,
    /// Analysis window duration in seconds (default: 0.040). The window
    /// length in samples is the next power of two at the sample rate.
    pub window_duration: f64,
    /// Analysis window family (default: `Hamming`).
    pub window_type: WindowType,
    /// Frequencies below this cutoff (in Hz, default: 100.0) are always kept
    /// in the background. DC is never affected. Set to 0.0 to disable.
    pub cutoff_frequency: f64,
    /// Period search range in seconds, inclusive (default: (1.0, 10.0)).
    pub period_range: (f64, f64),
    /// Segment length in seconds for the segmented and adaptive strategies
    /// (default: 10.0).
    pub segment_length: f64,
    /// Segment step in seconds for the segmented strategy (default: 5.0).
    pub segment_step: f64,
    /// Median filter order for the adaptive strategy; must be odd
    /// (default: 5).
    pub filter_order: usize,
    /// Minimum similarity for a frame to count as a repeating neighbor
    /// (default: 0.0).
    pub similarity_threshold: f32,
    /// Minimum spacing between repeating neighbors in seconds
    /// (default: 1.0).
    pub similarity_distance: f64,
    /// Maximum number of repeating neighbors per frame (default: 100).
    pub similarity_count: usize,
    /// History buffer duration in seconds for the streaming strategy
    /// (default: 5.0).
    pub buffer_duration: f64,
}

impl SeparationParams {
    /// Create parameters with defaults for the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
            strategy: Strategy::FixedPeriod,
            window_duration: 0.040,
            window_type: WindowType::Hamming,
            cutoff_frequency: 100.0,
            period_range: (1.0, 10.0),
            segment_length: 10.0,
            segment_step: 5.0,
            filter_order: 5,
            similarity_threshold: 0.0,
            similarity_distance: 1.0,
            similarity_count: 100,
            buffer_duration: 5.0,
        }
    }

    /// Set the number of channels.
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// Set the separation strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the analysis window duration in seconds.
    pub fn with_window_duration(mut self, seconds: f64) -> Self {
        self.window_duration = seconds;
        self
    }

    /// Set the analysis window family.
    pub fn with_window_type(mut self, window_type: WindowType) -> Self {
        self.window_type = window_type;
        self
    }

    /// Set the high-pass cutoff in Hz below which content always stays in
    /// the background.
    pub fn with_cutoff_frequency(mut self, hz: f64) -> Self {
        self.cutoff_frequency = hz;
        self
    }

    /// Set the period search range in seconds.
    pub fn with_period_range(mut self, low: f64, high: f64) -> Self {
        self.period_range = (low, high);
        self
    }

    /// Set the segment length and step in seconds.
    pub fn with_segmentation(mut self, length: f64, step: f64) -> Self {
        self.segment_length = length;
        self.segment_step = step;
        self
    }

    /// Set the adaptive median filter order.
    pub fn with_filter_order(mut self, order: usize) -> Self {
        self.filter_order = order;
        self
    }

    /// Set the similarity threshold, neighbor spacing in seconds, and
    /// neighbor cap.
    pub fn with_similarity(mut self, threshold: f32, distance: f64, count: usize) -> Self {
        self.similarity_threshold = threshold;
        self.similarity_distance = distance;
        self.similarity_count = count;
        self
    }

    /// Set the streaming history buffer duration in seconds.
    pub fn with_buffer_duration(mut self, seconds: f64) -> Self {
        self.buffer_duration = seconds;
        self
    }

    /// Validate all parameters.
    ///
    /// Every field is checked whichever strategy is selected, and duration
    /// fields are capped at ten minutes.
    pub fn validate(&self) -> Result<(), SeparationError> {
        if self.sample_rate == 0 {
            return Err(SeparationError::InvalidSampleRate(self.sample_rate));
        }
        if self.channels == 0 {
            return Err(SeparationError::InvalidChannels(self.channels));
        }
        if !self.window_duration.is_finite()
            || self.window_duration <= 0.0
            || self.window_duration > MAX_DURATION_SECS
        {
            return Err(SeparationError::InvalidWindowDuration(self.window_duration));
        }
        if !self.cutoff_frequency.is_finite() || self.cutoff_frequency < 0.0 {
            return Err(SeparationError::InvalidCutoff(self.cutoff_frequency));
        }
        let (low, high) = self.period_range;
        if !low.is_finite()
            || !high.is_finite()
            || low <= 0.0
            || high < low
            || high > MAX_DURATION_SECS
        {
            return Err(SeparationError::InvalidPeriodRange { low, high });
        }
        if !self.segment_length.is_finite()
            || !self.segment_step.is_finite()
            || self.segment_length <= 0.0
            || self.segment_step <= 0.0
            || self.segment_step > self.segment_length
            || self.segment_length > MAX_DURATION_SECS
        {
            return Err(SeparationError::InvalidSegmentation {
                length: self.segment_length,
                step: self.segment_step,
            });
        }
        if self.filter_order % 2 == 0 {
            return Err(SeparationError::InvalidFilterOrder(self.filter_order));
        }
        if !self.similarity_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.similarity_threshold)
        {
            return Err(SeparationError::InvalidSimilarityThreshold(
                self.similarity_threshold,
            ));
        }
        if !self.similarity_distance.is_finite()
            || self.similarity_distance < 0.0
            || self.similarity_distance > MAX_DURATION_SECS
        {
            return Err(SeparationError::InvalidSimilarityDistance(
                self.similarity_distance,
            ));
        }
        if self.similarity_count == 0 {
            return Err(SeparationError::InvalidSimilarityCount(
                self.similarity_count,
            ));
        }
        if !self.buffer_duration.is_finite()
            || self.buffer_duration <= 0.0
            || self.buffer_duration > MAX_DURATION_SECS
        {
            return Err(SeparationError::InvalidBufferDuration(self.buffer_duration));
        }
        Ok(())
    }
}

/// Frame-domain parameters resolved from [`SeparationParams`].
///
/// All second-valued settings are converted once, against the sample rate and
/// hop size, when processing starts. Callers must run
/// [`SeparationParams::validate`] first.
#[derive(Debug, Clone)]
pub(crate) struct FramePlan {
    /// Analysis window length in samples; a power of two.
    pub window_size: usize,
    /// Hop size in samples: half the window.
    pub step: usize,
    /// Analysis window samples.
    pub window: Vec<Sample>,
    /// First bin not forced into the background; bins `1..cutoff_bin` are.
    pub cutoff_bin: usize,
    /// Inclusive period search range in frames.
    pub period_lags: (usize, usize),
    /// Segment length in samples (segmented strategy).
    pub segment_samples: usize,
    /// Segment step in samples (segmented strategy).
    pub segment_stride: usize,
    /// Sliding beat-spectrogram window in frames (adaptive strategy).
    pub segment_frames: usize,
    /// Adaptive median filter order; odd.
    pub filter_order: usize,
    /// Minimum similarity for repeating neighbors.
    pub similarity_threshold: f32,
    /// Minimum spacing between repeating neighbors in frames.
    pub similarity_spacing: usize,
    /// Maximum repeating neighbors per frame.
    pub similarity_count: usize,
    /// Streaming history capacity in frames.
    pub buffer_frames: usize,
}

impl FramePlan {
    pub fn from_params(params: &SeparationParams) -> Self {
        let sr = params.sample_rate as f64;
        let target = (params.window_duration * sr).ceil() as usize;
        let window_size = target.next_power_of_two().max(2);
        let step = window_size / 2;
        let window = generate_window(params.window_type, window_size);

        let cutoff_bin = (params.cutoff_frequency * window_size as f64 / sr).ceil() as usize;

        let to_frames = |seconds: f64| (seconds * sr / step as f64).round() as usize;
        let low = to_frames(params.period_range.0).max(1);
        let high = to_frames(params.period_range.1).max(low);

        let buffer = (params.buffer_duration * sr - window_size as f64) / step as f64 + 1.0;
        let buffer_frames = if buffer < 1.0 { 1 } else { buffer.round() as usize };

        Self {
            window_size,
            step,
            window,
            cutoff_bin,
            period_lags: (low, high),
            segment_samples: ((params.segment_length * sr).round() as usize).max(1),
            segment_stride: ((params.segment_step * sr).round() as usize).max(1),
            segment_frames: to_frames(params.segment_length).max(1),
            filter_order: params.filter_order,
            similarity_threshold: params.similarity_threshold,
            similarity_spacing: to_frames(params.similarity_distance),
            similarity_count: params.similarity_count,
            buffer_frames,
        }
    }
}
