//! Render-side synthesis voice
//!
//! Owns everything the audio callback touches: the two phase accumulators,
//! the effect chain and the receiving end of the parameter hand-off. A voice is
//! moved into the output device's callback and never shared.
//!
//! Per frame:
//! - vibrato perturbs the instantaneous frequency,
//!   `freq = max(60, base + depth * sin(vibrato_phase))`
//! - the oscillator pair is `0.7 * sin(phase) + 0.3 * sin(phase / 2)`
//! - the dry sample passes through the delay and reverb inserts
//!
//! **REAL-TIME SAFE**: no locks, no allocation, no logging.

use crate::audio::effects::EffectsChain;
use crate::audio::params::{ParamReceiver, SynthParams};
use crate::audio::types::AudioFrame;
use pulsetone_common::config::SynthConfig;
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lowest instantaneous oscillator frequency in Hz
pub const MIN_OSCILLATOR_HZ: f64 = 60.0;

pub struct SynthVoice {
    receiver: ParamReceiver,
    params: SynthParams,
    /// Set by the engine on stop; forces silence ahead of the stream halting
    halted: Arc<AtomicBool>,
    effects: EffectsChain,
    sample_rate: f64,
    vibrato_rate_hz: f64,
    phase: f64,
    vibrato_phase: f64,
    control_block_frames: usize,
    frames_until_poll: usize,
}

impl SynthVoice {
    /// Build a voice for one output stream.
    ///
    /// # Arguments
    /// * `receiver` - Render half of the parameter hand-off
    /// * `halted` - Engine-owned silence flag
    /// * `sample_rate` - Rate the device will pull frames at
    /// * `config` - Vibrato rate, control block and effect sizing
    pub fn new(receiver: ParamReceiver, halted: Arc<AtomicBool>, sample_rate: u32, config: &SynthConfig) -> Self {
        let sample_rate = f64::from(sample_rate.max(1));
        let params = receiver.current();
        let mut effects = EffectsChain::new(sample_rate, config.max_delay_sec, config.delay_feedback as f32);
        effects.configure(params.delay_time, params.delay_mix, params.reverb_mix);
        Self {
            receiver,
            params,
            halted,
            effects,
            sample_rate,
            vibrato_rate_hz: config.vibrato_rate_hz,
            phase: 0.0,
            vibrato_phase: 0.0,
            control_block_frames: config.control_block_frames.max(1),
            frames_until_poll: 0,
        }
    }

    /// Parameters in effect for the current control block
    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    /// Oscillator phases `(main, vibrato)`, each in `[0, 2π)`
    pub fn phases(&self) -> (f64, f64) {
        (self.phase, self.vibrato_phase)
    }

    /// Produce the next output frame
    pub fn next_frame(&mut self) -> AudioFrame {
        if self.frames_until_poll == 0 {
            self.refresh_params();
            self.frames_until_poll = self.control_block_frames;
        }
        self.frames_until_poll -= 1;

        if self.halted.load(Ordering::Relaxed) {
            return AudioFrame::zero();
        }

        let dry = self.oscillate();
        let mut frame = AudioFrame::from_mono(self.effects.process(dry as f32));
        frame.clamp();
        frame
    }

    /// Fill an interleaved buffer, duplicating each frame across `channels`
    pub fn fill(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let audio = self.next_frame();
            for (i, sample) in frame.iter_mut().enumerate() {
                *sample = if i % 2 == 0 { audio.left } else { audio.right };
            }
        }
    }

    fn refresh_params(&mut self) {
        let params = self.receiver.poll();
        if params != self.params {
            self.effects
                .configure(params.delay_time, params.delay_mix, params.reverb_mix);
            self.params = params;
        }
    }

    /// Advance both oscillators by one sample and return the dry output
    fn oscillate(&mut self) -> f64 {
        let vibrato = self.params.vibrato_depth * self.vibrato_phase.sin();
        self.vibrato_phase = wrap_phase(self.vibrato_phase + TAU * self.vibrato_rate_hz / self.sample_rate);

        let freq = (self.params.base_frequency + vibrato).max(MIN_OSCILLATOR_HZ);
        self.phase = wrap_phase(self.phase + TAU * freq / self.sample_rate);

        if self.params.muted {
            return 0.0;
        }
        let mixed = 0.7 * self.phase.sin() + 0.3 * (self.phase * 0.5).sin();
        self.params.amplitude * mixed
    }
}

/// Wrap an accumulator that advanced by less than one cycle back into `[0, 2π)`
fn wrap_phase(phase: f64) -> f64 {
    if phase >= TAU {
        phase - TAU
    } else {
        phase
    }
}
