//! Short-time Fourier transform with constant-overlap-add resynthesis.
//!
//! The forward transform pads the signal so that every sample sits under a
//! full complement of analysis windows: `window - step` zeros in front, and
//! enough zeros behind to fill the final frame. The inverse transform
//! overlap-adds the raw inverse FFTs (no synthesis window), removes the edge
//! padding, and divides by the constant window overlap sum. For the periodic
//! windows in [`crate::core::window`] at 50% overlap this round-trips the
//! signal to within floating-point error.

use crate::core::fft::COMPLEX_ZERO;
use crate::core::window::overlap_sum;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Short-time transform engine.
///
/// Owns the analysis window and the pre-planned forward and inverse FFTs so
/// repeated calls reuse the same plan.
pub struct Stft {
    window: Vec<f32>,
    step: usize,
    fft_forward: Arc<dyn Fft<f32>>,
    fft_inverse: Arc<dyn Fft<f32>>,
    cola_gain: f32,
}

impl Stft {
    /// Creates a transform engine for the given analysis window and hop size.
    pub fn new(window: Vec<f32>, step: usize) -> Self {
        let mut planner = FftPlanner::new();
        let size = window.len();
        let fft_forward = planner.plan_fft_forward(size);
        let fft_inverse = planner.plan_fft_inverse(size);
        let cola_gain = overlap_sum(&window, step);
        Self {
            window,
            step,
            fft_forward,
            fft_inverse,
            cola_gain,
        }
    }

    /// Analysis window length in samples.
    pub fn window_size(&self) -> usize {
        self.window.len()
    }

    /// Hop size in samples.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Constant overlap-add gain of the analysis window at the hop size.
    pub fn cola_gain(&self) -> f32 {
        self.cola_gain
    }

    /// Number of frames [`forward`](Self::forward) produces for an input of
    /// `num_samples` samples.
    pub fn num_frames(&self, num_samples: usize) -> usize {
        let size = self.window.len();
        (size - self.step + num_samples + self.step - 1) / self.step
    }

    /// Forward transform: one full-length complex spectrum per frame.
    pub fn forward(&self, samples: &[f32]) -> Vec<Vec<Complex<f32>>> {
        let size = self.window.len();
        let num_frames = self.num_frames(samples.len());
        let front = size - self.step;

        let mut padded = vec![0.0f32; front + num_frames * self.step];
        padded[front..front + samples.len()].copy_from_slice(samples);

        let mut frames = Vec::with_capacity(num_frames);
        let mut buf = vec![COMPLEX_ZERO; size];
        for frame_idx in 0..num_frames {
            let pos = frame_idx * self.step;
            for (i, slot) in buf.iter_mut().enumerate() {
                *slot = Complex::new(padded[pos + i] * self.window[i], 0.0);
            }
            self.fft_forward.process(&mut buf);
            frames.push(buf.clone());
        }
        frames
    }

    /// Forward transform of a single frame of exactly
    /// [`window_size`](Self::window_size) samples.
    pub fn forward_frame(&self, frame: &[f32]) -> Vec<Complex<f32>> {
        let mut buf: Vec<Complex<f32>> = frame
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        self.fft_forward.process(&mut buf);
        buf
    }

    /// Inverse transform with overlap-add.
    ///
    /// Removes the edge padding [`forward`](Self::forward) introduced and
    /// divides by the overlap gain. The result holds at least as many samples
    /// as the original signal; callers truncate to the length they know.
    pub fn inverse(&self, frames: &[Vec<Complex<f32>>]) -> Vec<f32> {
        let size = self.window.len();
        if frames.is_empty() {
            return vec![];
        }
        let total = self.step * (frames.len() - 1) + size;
        let norm = 1.0 / size as f32;
        let mut signal = vec![0.0f32; total];
        let mut buf = vec![COMPLEX_ZERO; size];
        for (frame_idx, frame) in frames.iter().enumerate() {
            buf.copy_from_slice(frame);
            self.fft_inverse.process(&mut buf);
            let pos = frame_idx * self.step;
            for (i, value) in buf.iter().enumerate() {
                signal[pos + i] += value.re * norm;
            }
        }
        let front = size - self.step;
        let mut out: Vec<f32> = signal[front..total - front].to_vec();
        for sample in out.iter_mut() {
            *sample /= self.cola_gain;
        }
        out
    }

    /// Inverse FFT of a single frame, scaled but not overlap-added.
    ///
    /// The streaming processor accumulates these itself and divides by
    /// [`cola_gain`](Self::cola_gain) once a region is complete.
    pub fn inverse_frame(&self, frame: &[Complex<f32>]) -> Vec<f32> {
        let size = self.window.len();
        let norm = 1.0 / size as f32;
        let mut buf = frame.to_vec();
        self.fft_inverse.process(&mut buf);
        buf.iter().map(|value| value.re * norm).collect()
    }
}

/// Half-spectrum magnitudes (bins `0..=size/2`) for each frame.
pub fn half_magnitudes(frames: &[Vec<Complex<f32>>]) -> Vec<Vec<f32>> {
    frames
        .iter()
        .map(|frame| {
            let num_bins = frame.len() / 2 + 1;
            frame[..num_bins].iter().map(|c| c.norm()).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::window::{generate_window, WindowType};

    fn test_signal(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / 8192.0;
                0.6 * (2.0 * std::f32::consts::PI * 220.0 * t).sin()
                    + 0.3 * (2.0 * std::f32::consts::PI * 531.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_frame_count() {
        let stft = Stft::new(generate_window(WindowType::Hamming, 512), 256);
        // ceil((512 - 256 + 1000) / 256) = 5
        assert_eq!(stft.num_frames(1000), 5);
        let frames = stft.forward(&test_signal(1000));
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].len(), 512);
    }

    #[test]
    fn test_round_trip_hamming() {
        let stft = Stft::new(generate_window(WindowType::Hamming, 512), 256);
        let signal = test_signal(3000);
        let frames = stft.forward(&signal);
        let restored = stft.inverse(&frames);
        assert!(restored.len() >= signal.len());
        for (i, (&a, &b)) in signal.iter().zip(restored.iter()).enumerate() {
            assert!((a - b).abs() < 1e-4, "sample {}: {} vs {}", i, a, b);
        }
    }

    #[test]
    fn test_round_trip_hann() {
        let stft = Stft::new(generate_window(WindowType::Hann, 512), 256);
        let signal = test_signal(2500);
        let frames = stft.forward(&signal);
        let restored = stft.inverse(&frames);
        for (&a, &b) in signal.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_round_trip_impulse() {
        let stft = Stft::new(generate_window(WindowType::Hamming, 512), 256);
        let mut signal = vec![0.0f32; 1024];
        signal[300] = 1.0;
        let frames = stft.forward(&signal);
        let restored = stft.inverse(&frames);
        for (&a, &b) in signal.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_inverse_of_empty() {
        let stft = Stft::new(generate_window(WindowType::Hamming, 512), 256);
        assert!(stft.inverse(&[]).is_empty());
    }

    #[test]
    fn test_silence_round_trips_to_exact_zeros() {
        let stft = Stft::new(generate_window(WindowType::Hamming, 512), 256);
        let frames = stft.forward(&vec![0.0f32; 2000]);
        let restored = stft.inverse(&frames);
        assert!(restored.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_half_magnitudes_shape() {
        let stft = Stft::new(generate_window(WindowType::Hamming, 512), 256);
        let mags = half_magnitudes(&stft.forward(&test_signal(1000)));
        assert_eq!(mags.len(), 5);
        assert_eq!(mags[0].len(), 257);
        assert!(mags.iter().flatten().all(|&m| m >= 0.0));
    }

    #[test]
    fn test_forward_frame_matches_forward() {
        let stft = Stft::new(generate_window(WindowType::Hamming, 512), 256);
        let signal = test_signal(2000);
        let frames = stft.forward(&signal);
        // Frame 2 of the padded stream covers original samples 256..768
        let mut padded = vec![0.0f32; 256];
        padded.extend_from_slice(&signal);
        let single = stft.forward_frame(&padded[512..1024]);
        for (a, b) in frames[2].iter().zip(single.iter()) {
            assert!((a - b).norm() < 1e-5);
        }
    }

    #[test]
    fn test_cola_gain_hamming() {
        let stft = Stft::new(generate_window(WindowType::Hamming, 512), 256);
        assert!((stft.cola_gain() - 1.08).abs() < 1e-5);
    }
}
