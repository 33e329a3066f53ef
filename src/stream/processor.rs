use std::collections::VecDeque;

use crate::analysis::similarity::{cosine, neighbor_indices, unit_frame};
use crate::core::stft::Stft;
use crate::core::types::{FramePlan, SeparationParams, Strategy};
use crate::error::SeparationError;
use crate::mask::{apply_high_pass, apply_mask_frame, median_in_place, soft_ratio};
use log::debug;

/// One analysis frame kept in the similarity history.
struct HistoryFrame {
    /// Channel-mean magnitude spectrum, normalized to unit length.
    unit_mean: Vec<f32>,
    /// Raw half-spectrum magnitudes per channel.
    channel_mags: Vec<Vec<f32>>,
}

/// Streaming chunk-based separator for online use.
///
/// Accumulates interleaved input samples, analyzes one window at a time,
/// and masks each frame against the most similar frames seen so far. The
/// history is bounded by `buffer_duration`, so memory stays constant no
/// matter how long the stream runs.
///
/// Output begins as soon as one full window has been received; early
/// frames are compared against whatever history exists at that point.
pub struct StreamingSeparator {
    params: SeparationParams,
    plan: FramePlan,
    stft: Stft,
    /// Pending input per channel, pre-seeded with the leading pad.
    window_buffers: Vec<Vec<f32>>,
    /// Overlap-add accumulators per channel, one window long.
    ola_buffers: Vec<Vec<f32>>,
    history: VecDeque<HistoryFrame>,
    frames_processed: usize,
    /// Interleaved samples accepted so far, for ordering checks.
    samples_consumed: usize,
    /// Whole sample frames accepted so far, per channel.
    channel_samples: usize,
    emitted_per_channel: usize,
    /// Leftover interleaved samples that did not fill a sample frame.
    carry: Vec<f32>,
}

impl StreamingSeparator {
    /// Creates a new streaming separator.
    ///
    /// The `strategy` field of `params` is forced to
    /// [`Strategy::StreamingSimilarity`]; all other fields are honored.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters fail validation.
    pub fn new(params: SeparationParams) -> Result<Self, SeparationError> {
        let mut params = params;
        params.strategy = Strategy::StreamingSimilarity;
        params.validate()?;

        let plan = FramePlan::from_params(&params);
        let num_channels = params.channels as usize;
        let seed = plan.window_size - plan.step;
        debug!(
            "streaming separator: window {} step {} history capacity {}",
            plan.window_size,
            plan.step,
            plan.buffer_frames
        );

        let stft = Stft::new(plan.window.clone(), plan.step);
        Ok(Self {
            params,
            window_buffers: vec![vec![0.0; seed]; num_channels],
            ola_buffers: vec![vec![0.0; plan.window_size]; num_channels],
            history: VecDeque::with_capacity(plan.buffer_frames),
            frames_processed: 0,
            samples_consumed: 0,
            channel_samples: 0,
            emitted_per_channel: 0,
            carry: Vec::new(),
            plan,
            stft,
        })
    }

    /// Processes a chunk of interleaved samples.
    ///
    /// Returns the separated background that became available, also
    /// interleaved. The output lags the input by [`latency_samples`]
    /// per channel and may be empty while the first window fills.
    ///
    /// Chunk boundaries are immaterial: any way of splitting a stream
    /// into chunks yields the same concatenated output.
    ///
    /// [`latency_samples`]: StreamingSeparator::latency_samples
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk contains non-finite samples.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, SeparationError> {
        self.process_at(self.samples_consumed, input)
    }

    /// Processes a chunk that starts at a known stream position.
    ///
    /// `start_sample` is the interleaved offset of `input[0]` within the
    /// stream and must equal the total number of samples accepted so far.
    ///
    /// # Errors
    ///
    /// Returns [`SeparationError::OutOfOrderChunk`] if `start_sample`
    /// does not line up with the stream position, leaving the separator
    /// state untouched, and [`SeparationError::NonFiniteInput`] if the
    /// chunk contains NaN or infinite samples.
    pub fn process_at(
        &mut self,
        start_sample: usize,
        input: &[f32],
    ) -> Result<Vec<f32>, SeparationError> {
        if start_sample != self.samples_consumed {
            return Err(SeparationError::OutOfOrderChunk {
                expected: self.samples_consumed,
                received: start_sample,
            });
        }
        if input.iter().any(|s| !s.is_finite()) {
            return Err(SeparationError::NonFiniteInput);
        }
        self.samples_consumed += input.len();

        let num_channels = self.params.channels as usize;
        let merged: Vec<f32>;
        let data: &[f32] = if self.carry.is_empty() {
            input
        } else {
            let mut joined = Vec::with_capacity(self.carry.len() + input.len());
            joined.extend_from_slice(&self.carry);
            joined.extend_from_slice(input);
            self.carry.clear();
            merged = joined;
            &merged
        };

        let whole = data.len() - data.len() % num_channels;
        self.carry.extend_from_slice(&data[whole..]);
        self.channel_samples += whole / num_channels;
        for (ch, window) in self.window_buffers.iter_mut().enumerate() {
            window.extend(data[..whole].iter().skip(ch).step_by(num_channels));
        }

        Ok(self.drain_ready_frames())
    }

    /// Flushes the stream tail.
    ///
    /// Pads the pending input with silence, processes the final windows,
    /// and returns the remaining output so that the total emitted length
    /// exactly matches the total input length. The separator should be
    /// [`reset`] before reuse.
    ///
    /// [`reset`]: StreamingSeparator::reset
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` mirrors [`process`].
    ///
    /// [`process`]: StreamingSeparator::process
    pub fn flush(&mut self) -> Result<Vec<f32>, SeparationError> {
        let size = self.plan.window_size;
        let step = self.plan.step;
        let n = self.channel_samples;
        let total_frames = (size - step + n + step - 1) / step;
        let zeros_needed = total_frames * step - n;
        for window in self.window_buffers.iter_mut() {
            window.extend(std::iter::repeat(0.0f32).take(zeros_needed));
        }

        let emitted_before = self.emitted_per_channel;
        let tail = self.drain_ready_frames();

        // The zero padding reconstructs to samples past the end of the
        // stream; keep only what corresponds to real input.
        let num_channels = self.params.channels as usize;
        let allowed = n.saturating_sub(emitted_before) * num_channels;
        let mut tail = tail;
        tail.truncate(allowed);
        Ok(tail)
    }

    /// Resets the separator to its freshly constructed state.
    pub fn reset(&mut self) {
        let seed = self.plan.window_size - self.plan.step;
        for window in self.window_buffers.iter_mut() {
            window.clear();
            window.resize(seed, 0.0);
        }
        for ola in self.ola_buffers.iter_mut() {
            for slot in ola.iter_mut() {
                *slot = 0.0;
            }
        }
        self.history.clear();
        self.carry.clear();
        self.frames_processed = 0;
        self.samples_consumed = 0;
        self.channel_samples = 0;
        self.emitted_per_channel = 0;
    }

    /// Returns the input-to-output latency in samples per channel.
    ///
    /// This is the number of samples per channel that must be fed in
    /// before the first output sample is produced.
    pub fn latency_samples(&self) -> usize {
        self.plan.window_size
    }

    /// Returns the input-to-output latency in seconds.
    pub fn latency_secs(&self) -> f64 {
        self.latency_samples() as f64 / self.params.sample_rate as f64
    }

    /// Returns the number of frames currently held in the history.
    pub fn buffered_frames(&self) -> usize {
        self.history.len()
    }

    /// Returns the parameters the separator was built with.
    pub fn params(&self) -> &SeparationParams {
        &self.params
    }

    /// Processes every full window waiting in the input buffers and
    /// returns the interleaved output.
    fn drain_ready_frames(&mut self) -> Vec<f32> {
        let step = self.plan.step;
        let num_channels = self.window_buffers.len();
        let mut output = Vec::new();
        while self.window_buffers[0].len() >= self.plan.window_size {
            if let Some(emitted) = self.process_frame() {
                output.reserve(step * num_channels);
                for i in 0..step {
                    for channel in &emitted {
                        output.push(channel[i]);
                    }
                }
            }
        }
        output
    }

    /// Analyzes, masks, and resynthesizes one window from every channel.
    ///
    /// Returns `None` for the very first frame, whose overlap-add region
    /// is still incomplete; afterwards each call yields `step` samples
    /// per channel.
    fn process_frame(&mut self) -> Option<Vec<Vec<f32>>> {
        let size = self.plan.window_size;
        let step = self.plan.step;
        let num_bins = size / 2 + 1;
        let num_channels = self.window_buffers.len();

        let mut channel_frames = Vec::with_capacity(num_channels);
        let mut channel_mags = Vec::with_capacity(num_channels);
        for window in &self.window_buffers {
            let frame = self.stft.forward_frame(&window[..size]);
            let mags: Vec<f32> = frame[..num_bins].iter().map(|c| c.norm()).collect();
            channel_frames.push(frame);
            channel_mags.push(mags);
        }
        for window in self.window_buffers.iter_mut() {
            window.drain(..step);
        }

        let mean: Vec<f32> = (0..num_bins)
            .map(|bin| {
                let sum: f64 = channel_mags.iter().map(|mags| mags[bin] as f64).sum();
                (sum / num_channels as f64) as f32
            })
            .collect();
        let unit_mean = unit_frame(&mean);

        if self.history.len() == self.plan.buffer_frames {
            self.history.pop_front();
        }
        self.history.push_back(HistoryFrame {
            unit_mean,
            channel_mags,
        });

        let current = self.history.len() - 1;
        let row: Vec<f32> = {
            let query = &self.history[current].unit_mean;
            self.history
                .iter()
                .map(|frame| cosine(query, &frame.unit_mean))
                .collect()
        };
        let neighbors = neighbor_indices(
            &row,
            self.plan.similarity_threshold,
            self.plan.similarity_spacing,
            self.plan.similarity_count,
        );

        let first = self.frames_processed == 0;
        self.frames_processed += 1;

        let mut emitted: Vec<Vec<f32>> = Vec::with_capacity(num_channels);
        let mut taps: Vec<f32> = Vec::with_capacity(neighbors.len().max(1));
        for (ch, frame) in channel_frames.iter().enumerate() {
            let mut mask = Vec::with_capacity(num_bins);
            {
                let observed = &self.history[current].channel_mags[ch];
                for bin in 0..num_bins {
                    taps.clear();
                    if neighbors.is_empty() {
                        taps.push(observed[bin]);
                    } else {
                        taps.extend(
                            neighbors
                                .iter()
                                .map(|&idx| self.history[idx].channel_mags[ch][bin]),
                        );
                    }
                    let model = median_in_place(&mut taps);
                    mask.push(soft_ratio(model, observed[bin]));
                }
            }
            apply_high_pass(std::slice::from_mut(&mut mask), self.plan.cutoff_bin);

            let masked = apply_mask_frame(frame, &mask);
            let time = self.stft.inverse_frame(&masked);
            let gain = self.stft.cola_gain();
            let ola = &mut self.ola_buffers[ch];
            for (slot, &value) in ola.iter_mut().zip(time.iter()) {
                *slot += value;
            }
            if !first {
                emitted.push(ola[..step].iter().map(|&v| v / gain).collect());
            }
            ola.copy_within(step.., 0);
            for slot in ola[size - step..].iter_mut() {
                *slot = 0.0;
            }
        }

        if first {
            None
        } else {
            self.emitted_per_channel += step;
            Some(emitted)
        }
    }
}
