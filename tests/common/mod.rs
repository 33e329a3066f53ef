use std::f32::consts::PI;

use repet::{SeparationError, SeparationParams, StreamingSeparator};

pub fn gen_sine(freq_hz: f32, sr: u32, n: usize, amp: f32) -> Vec<f32> {
    (0..n)
        .map(|i| amp * (2.0 * PI * freq_hz * i as f32 / sr as f32).sin())
        .collect()
}

/// One period built from four distinct tonal quarters, then tiled so the
/// signal repeats sample-exactly with period `period_samples`. The prime
/// frequencies are detuned from a harmonic series: no voice repeats or
/// sign-flips within a quarter, so two analysis frames share a magnitude
/// spectrum only when they sit a whole period apart.
pub fn repeating_pattern(sr: u32, period_samples: usize, num_periods: usize) -> Vec<f32> {
    let quarter = period_samples / 4;
    let voices = [(223.0f32, 0.8f32), (331.0, 0.6), (439.0, 0.7), (547.0, 0.5)];

    let mut period = Vec::with_capacity(period_samples);
    for (q, &(freq, amp)) in voices.iter().enumerate() {
        let len = if q == voices.len() - 1 {
            period_samples - 3 * quarter
        } else {
            quarter
        };
        for i in 0..len {
            period.push(amp * (2.0 * PI * freq * i as f32 / sr as f32).sin());
        }
    }

    let mut out = Vec::with_capacity(period_samples * num_periods);
    for _ in 0..num_periods {
        out.extend_from_slice(&period);
    }
    out
}

/// Adds short wideband noise bursts in place. Burst positions should not
/// line up with the repeating period, so the bursts act as foreground.
pub fn add_noise_bursts(signal: &mut [f32], positions: &[usize], burst_len: usize, amp: f32) {
    let mut state = 0x9e37_79b9u32;
    for &pos in positions {
        for sample in signal.iter_mut().skip(pos).take(burst_len) {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            *sample += amp * (state as f32 / u32::MAX as f32 * 2.0 - 1.0);
        }
    }
}

/// Normalized cross-correlation at lag zero, over the shorter slice.
pub fn correlation(a: &[f32], b: &[f32]) -> f64 {
    let n = a.len().min(b.len());
    let mut dot = 0.0f64;
    let mut a2 = 0.0f64;
    let mut b2 = 0.0f64;
    for i in 0..n {
        let av = a[i] as f64;
        let bv = b[i] as f64;
        dot += av * bv;
        a2 += av * av;
        b2 += bv * bv;
    }
    if a2 <= 0.0 || b2 <= 0.0 {
        return 0.0;
    }
    dot / (a2.sqrt() * b2.sqrt())
}

pub fn windowed_rms(signal: &[f32], start: usize, len: usize) -> f64 {
    let start = start.min(signal.len());
    let end = (start + len).min(signal.len());
    if end <= start {
        return 0.0;
    }
    let sum_sq: f64 = signal[start..end]
        .iter()
        .map(|&s| {
            let v = s as f64;
            v * v
        })
        .sum();
    (sum_sq / (end - start) as f64).sqrt()
}

/// Single-bin DFT: mean magnitude of the signal at one frequency.
pub fn energy_at_freq(signal: &[f32], sr: u32, freq_hz: f32) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let mut re = 0.0f64;
    let mut im = 0.0f64;
    for (i, &s) in signal.iter().enumerate() {
        let angle = 2.0 * std::f64::consts::PI * freq_hz as f64 * i as f64 / sr as f64;
        let sv = s as f64;
        re += sv * angle.cos();
        im -= sv * angle.sin();
    }
    (re * re + im * im).sqrt() / signal.len() as f64
}

pub fn run_streaming(
    input: &[f32],
    params: SeparationParams,
    chunk_size: usize,
) -> Result<Vec<f32>, SeparationError> {
    let mut separator = StreamingSeparator::new(params)?;
    let mut output = Vec::new();
    for chunk in input.chunks(chunk_size.max(1)) {
        output.extend(separator.process(chunk)?);
    }
    output.extend(separator.flush()?);
    Ok(output)
}
