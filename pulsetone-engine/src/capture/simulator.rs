//! Simulated fingertip capture
//!
//! Generates red-channel intensities as a covered camera with the torch on
//! would report them: a bright baseline with slow respiratory wander, one
//! pulse per beat with slight beat-to-beat jitter, sensor noise and frame
//! timing jitter. An optional dropout lifts the finger off for a while.
//!
//! Seeded, so a session replays identically.

use crate::pipeline::Sample;
use pulsetone_common::config::CaptureConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::ops::Range;
use std::time::Duration;
use tracing::{info, trace};

/// Covered-camera red-channel level
const BASELINE: f64 = 150.0;
const PULSE_AMPLITUDE: f64 = 12.0;
const RESPIRATION_HZ: f64 = 0.25;
const RESPIRATION_AMPLITUDE: f64 = 3.0;
const SENSOR_NOISE: f64 = 2.0;
/// Fractional spread of each beat period around the nominal one
const BEAT_JITTER: f64 = 0.03;
/// Frame timestamp jitter as a fraction of the frame interval
const FRAME_JITTER: f64 = 0.1;

/// Ambient level with the finger lifted
const DROPOUT_LEVEL: f64 = 40.0;
const DROPOUT_SPREAD: f64 = 35.0;

pub struct SimulatedCapture {
    frame_rate: f64,
    bpm: f64,
    rng: StdRng,
    frame: u64,
    last_timestamp: f64,
    /// Position within the current beat, in cycles
    beat_phase: f64,
    beat_period: f64,
    dropout: Option<Range<f64>>,
    emitter_on: bool,
}

impl SimulatedCapture {
    pub fn new(config: &CaptureConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let beat_period = jittered_period(&mut rng, config.simulated_bpm);
        Self {
            frame_rate: config.frame_rate,
            bpm: config.simulated_bpm,
            rng,
            frame: 0,
            last_timestamp: 0.0,
            beat_phase: 0.0,
            beat_period,
            dropout: None,
            emitter_on: false,
        }
    }

    /// Lift the finger between `start_sec` and `start_sec + duration_sec`
    pub fn with_dropout(mut self, start_sec: f64, duration_sec: f64) -> Self {
        self.dropout = Some(start_sec..start_sec + duration_sec);
        self
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Nominal time between frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate)
    }

    pub fn emitter_on(&self) -> bool {
        self.emitter_on
    }

    /// Turn the torch on. Returns the new emitter state.
    pub fn start(&mut self) -> bool {
        info!(
            "Simulated capture started: {:.0} fps, {:.0} bpm",
            self.frame_rate, self.bpm
        );
        self.emitter_on = true;
        self.emitter_on
    }

    /// Turn the torch off. Returns the new emitter state.
    pub fn stop(&mut self) -> bool {
        info!("Simulated capture stopped after {} frames", self.frame);
        self.emitter_on = false;
        self.emitter_on
    }

    /// Whether `timestamp` falls inside the configured dropout
    pub fn in_dropout(&self, timestamp: f64) -> bool {
        self.dropout.as_ref().is_some_and(|d| d.contains(&timestamp))
    }

    /// Produce the next frame's sample
    pub fn next_sample(&mut self) -> Sample {
        let nominal = self.frame as f64 / self.frame_rate;
        let jitter = self.rng.gen_range(-FRAME_JITTER..FRAME_JITTER) / self.frame_rate;
        let timestamp = (nominal + jitter).max(self.last_timestamp);
        let dt = timestamp - self.last_timestamp;
        self.last_timestamp = timestamp;
        self.frame += 1;

        self.beat_phase += dt / self.beat_period;
        while self.beat_phase >= 1.0 {
            self.beat_phase -= 1.0;
            self.beat_period = jittered_period(&mut self.rng, self.bpm);
        }

        let intensity = if self.in_dropout(timestamp) {
            DROPOUT_LEVEL + self.rng.gen_range(-DROPOUT_SPREAD..DROPOUT_SPREAD)
        } else {
            BASELINE
                + RESPIRATION_AMPLITUDE * (TAU * RESPIRATION_HZ * timestamp).sin()
                + PULSE_AMPLITUDE * (TAU * self.beat_phase).sin()
                + self.rng.gen_range(-SENSOR_NOISE..SENSOR_NOISE)
        };

        Sample::new(timestamp, intensity.clamp(0.0, 255.0))
    }
}

impl Iterator for SimulatedCapture {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        Some(self.next_sample())
    }
}

fn jittered_period(rng: &mut StdRng, bpm: f64) -> f64 {
    let period = 60.0 / bpm * (1.0 + rng.gen_range(-BEAT_JITTER..BEAT_JITTER));
    trace!("Next simulated beat period {:.3}s", period);
    period
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture() -> SimulatedCapture {
        SimulatedCapture::new(&CaptureConfig::default())
    }

    #[test]
    fn test_timestamps_monotonic_near_frame_rate() {
        let samples: Vec<Sample> = capture().take(300).collect();
        for pair in samples.windows(2) {
            assert!(pair[1].timestamp >= pair[0].timestamp);
        }
        let span = samples[299].timestamp - samples[0].timestamp;
        assert!((span - 299.0 / 30.0).abs() < 0.01);
    }

    #[test]
    fn test_covered_intensity_range() {
        for sample in capture().take(600) {
            assert!(sample.intensity > 125.0 && sample.intensity < 175.0);
        }
    }

    #[test]
    fn test_dropout_falls_to_ambient() {
        let samples: Vec<Sample> = capture().with_dropout(2.0, 1.0).take(150).collect();
        for sample in &samples {
            if (2.0..3.0).contains(&sample.timestamp) {
                assert!(sample.intensity < 80.0);
            } else {
                assert!(sample.intensity > 125.0);
            }
        }
    }

    #[test]
    fn test_same_seed_replays() {
        let a: Vec<Sample> = capture().take(50).collect();
        let b: Vec<Sample> = capture().take(50).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_emitter_follows_start_stop() {
        let mut capture = capture();
        assert!(!capture.emitter_on());
        assert!(capture.start());
        assert!(!capture.stop());
    }
}
