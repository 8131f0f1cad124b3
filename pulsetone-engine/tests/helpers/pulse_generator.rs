//! Synthetic pulse windows
//!
//! Deterministic raw-intensity windows with a known beat period, used to
//! check the estimator end to end without the simulated capture's noise.

use pulsetone_engine::Sample;
use std::f64::consts::TAU;

/// Parallel timestamp and intensity columns
pub struct PulseWindow {
    pub timestamps: Vec<f64>,
    pub values: Vec<f64>,
}

impl PulseWindow {
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.timestamps
            .iter()
            .zip(&self.values)
            .map(|(&t, &v)| Sample::new(t, v))
    }
}

/// Sinusoidal pulse train sampled at `rate_hz`.
///
/// # Arguments
/// * `period_sec` - Beat period (0.8 s = 75 BPM)
/// * `phase_sec` - Delay of the first crest, to keep crests off sample midpoints
pub fn sine_pulse(
    baseline: f64,
    amplitude: f64,
    period_sec: f64,
    phase_sec: f64,
    rate_hz: f64,
    seconds: f64,
) -> PulseWindow {
    let count = (seconds * rate_hz).round() as usize;
    let timestamps: Vec<f64> = (0..count).map(|i| i as f64 / rate_hz).collect();
    let values = timestamps
        .iter()
        .map(|t| baseline + amplitude * (TAU * (t - phase_sec) / period_sec).sin())
        .collect();
    PulseWindow { timestamps, values }
}

/// Constant intensity, zero variance
pub fn flat_signal(level: f64, rate_hz: f64, count: usize) -> PulseWindow {
    PulseWindow {
        timestamps: (0..count).map(|i| i as f64 / rate_hz).collect(),
        values: vec![level; count],
    }
}
