//! FFT-related constants shared across the crate.

use rustfft::num_complex::Complex;

/// Zero-valued complex number, used for FFT buffer initialization.
pub const COMPLEX_ZERO: Complex<f32> = Complex::new(0.0, 0.0);

/// Additive guard on mask numerator and denominator so that silent
/// time-frequency cells resolve to a pass-through mask of 1 instead of NaN.
pub const MASK_EPSILON: f32 = 1e-8;

/// Floor for frame norms when unit-normalizing spectrogram columns.
pub const NORM_EPSILON: f64 = 1e-12;
