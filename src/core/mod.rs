//! Core types, window functions, and the short-time transform.

pub mod fft;
pub mod stft;
pub mod types;
pub mod window;

pub use stft::{half_magnitudes, Stft};
pub use types::*;
pub use window::{crossfade_ramps, generate_window, overlap_sum, WindowType};
