//! Beat spectrum, beat spectrogram, and repeating-period estimation.
//!
//! The beat spectrum measures how strongly a spectrogram repeats at each
//! frame lag: the unbiased autocorrelation of every frequency bin's power
//! over time, averaged across bins. A spike at lag `p` means the mixture
//! repeats every `p` frames. The beat spectrogram localizes the same measure
//! by sliding a fixed-length window over the frames, one frame at a time, so
//! signals whose period drifts get a period estimate per frame.

use crate::core::fft::COMPLEX_ZERO;
use crate::error::SeparationError;
use log::debug;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Forward/inverse FFT pair sized for linear autocorrelation of a series of
/// `num_frames` values (zero-padded to twice the length).
struct AutocorrFft {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    padded: usize,
}

impl AutocorrFft {
    fn new(num_frames: usize) -> Self {
        let padded = 2 * num_frames;
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(padded),
            inverse: planner.plan_fft_inverse(padded),
            padded,
        }
    }

    /// Beat spectrum of a frame-major power spectrogram whose frame count
    /// matches the planned size.
    fn beat_spectrum(&self, power: &[Vec<f32>]) -> Vec<f32> {
        let num_frames = power.len();
        let num_bins = power.first().map(|f| f.len()).unwrap_or(0);
        let mut acc = vec![0.0f64; num_frames];
        let mut buf = vec![COMPLEX_ZERO; self.padded];
        for bin in 0..num_bins {
            for slot in buf.iter_mut() {
                *slot = COMPLEX_ZERO;
            }
            for (t, frame) in power.iter().enumerate() {
                buf[t] = Complex::new(frame[bin], 0.0);
            }
            self.forward.process(&mut buf);
            for value in buf.iter_mut() {
                *value = Complex::new(value.norm_sqr(), 0.0);
            }
            self.inverse.process(&mut buf);
            // Unnormalized inverse FFT, then the unbiased lag count: lag k
            // has num_frames - k overlapping products.
            for (lag, slot) in acc.iter_mut().enumerate() {
                let raw = (buf[lag].re / self.padded as f32) as f64;
                *slot += raw / (num_frames - lag) as f64;
            }
        }
        if num_bins == 0 {
            return vec![0.0; num_frames];
        }
        acc.iter().map(|&v| (v / num_bins as f64) as f32).collect()
    }
}

/// Computes the beat spectrum of a power spectrogram (frame-major).
///
/// Index `k` of the result holds the mean unbiased autocorrelation of the
/// per-bin power series at a lag of `k` frames. Index 0 is the zero-lag
/// energy; values generally decay with lag, with spikes at multiples of the
/// repeating period.
pub fn beat_spectrum(power: &[Vec<f32>]) -> Vec<f32> {
    if power.is_empty() {
        return vec![];
    }
    AutocorrFft::new(power.len()).beat_spectrum(power)
}

/// Computes a beat spectrogram: one beat spectrum per frame, each over a
/// window of `segment_frames` frames centered on that frame.
///
/// The spectrogram is zero-padded at both ends so every frame gets a full
/// window; the result has one column per input frame, each `segment_frames`
/// lags long.
pub fn beat_spectrogram(power: &[Vec<f32>], segment_frames: usize) -> Vec<Vec<f32>> {
    let num_frames = power.len();
    if num_frames == 0 {
        return vec![];
    }
    let segment_frames = segment_frames.max(1);
    let num_bins = power[0].len();
    let front = segment_frames / 2;
    let back = segment_frames.saturating_sub(1) / 2;

    let zero_frame = vec![0.0f32; num_bins];
    let mut padded: Vec<Vec<f32>> = Vec::with_capacity(num_frames + front + back);
    padded.extend(std::iter::repeat(zero_frame.clone()).take(front));
    padded.extend_from_slice(power);
    padded.extend(std::iter::repeat(zero_frame).take(back));

    let fft = AutocorrFft::new(segment_frames);
    let columns: Vec<Vec<f32>> = (0..num_frames)
        .map(|t| fft.beat_spectrum(&padded[t..t + segment_frames]))
        .collect();
    debug!(
        "beat spectrogram: {} columns of {} lags",
        columns.len(),
        segment_frames
    );
    columns
}

/// Picks the repeating period in frames from a beat spectrum.
///
/// The strongest lag within `lags` (inclusive, in frames) wins, with ties
/// going to the shorter lag. The search never looks past a third of the
/// spectrum, so the repeating model always has at least three segments to
/// take a median over.
///
/// # Errors
///
/// Returns [`SeparationError::PeriodRangeOutsideSpectrum`] when no lag in
/// `lags` is searchable, which happens when the signal is too short for the
/// requested period range.
pub fn repeating_period(beat: &[f32], lags: (usize, usize)) -> Result<usize, SeparationError> {
    let max_lag = beat.len() / 3;
    let low = lags.0.max(1);
    let high = lags.1.min(max_lag);
    if low > high {
        return Err(SeparationError::PeriodRangeOutsideSpectrum {
            low: lags.0,
            high: lags.1,
            max_lag,
        });
    }
    let mut best = low;
    for lag in low + 1..=high {
        if beat[lag] > beat[best] {
            best = lag;
        }
    }
    Ok(best)
}

/// Picks a repeating period per frame from a beat spectrogram.
///
/// # Errors
///
/// Returns [`SeparationError::PeriodRangeOutsideSpectrum`] when `lags` does
/// not intersect the searchable lags of the spectrogram columns.
pub fn repeating_periods(
    beat_gram: &[Vec<f32>],
    lags: (usize, usize),
) -> Result<Vec<usize>, SeparationError> {
    beat_gram
        .iter()
        .map(|column| repeating_period(column, lags))
        .collect()
}
