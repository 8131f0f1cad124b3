//! Test helper modules for pulsetone-engine integration tests
//!
//! - pulse_generator: synthetic PPG windows with known heart rate
//! - audio_analysis: RMS and silence checks over rendered frames

#![allow(dead_code)]

pub mod audio_analysis;
pub mod pulse_generator;

pub use audio_analysis::{is_silent, rms};
pub use pulse_generator::{flat_signal, sine_pulse, PulseWindow};
