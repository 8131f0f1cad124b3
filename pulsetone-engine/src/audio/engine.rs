//! Synthesis engine lifecycle
//!
//! The engine is the control-thread face of the synthesizer: it maps
//! predictions to parameters, publishes snapshots to the render voice and
//! owns the output device. Device failures are logged and remembered, never
//! returned; audio is feedback, not part of the measurement path.
//!
//! State machine: **Stopped → Running → Stopped**.

use crate::audio::output::OutputDevice;
use crate::audio::params::{map_parameters, param_channel, ParamPublisher, SynthParams};
use crate::audio::synth::SynthVoice;
use crate::classify::Prediction;
use pulsetone_common::config::SynthConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Stopped,
    Running,
}

pub struct SynthesisEngine<D: OutputDevice> {
    device: D,
    config: SynthConfig,
    state: EngineState,
    /// Latest snapshot, handed to every new voice on start
    params: SynthParams,
    publisher: Option<ParamPublisher>,
    /// Silence flag shared with the running voice
    halted: Arc<AtomicBool>,
    last_error: Option<String>,
}

impl<D: OutputDevice> SynthesisEngine<D> {
    pub fn new(device: D, config: SynthConfig) -> Self {
        Self {
            device,
            config,
            state: EngineState::Stopped,
            params: SynthParams::default(),
            publisher: None,
            halted: Arc::new(AtomicBool::new(true)),
            last_error: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Most recent device failure, cleared by a successful start
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Parameters most recently published to the render voice
    pub fn current_params(&self) -> SynthParams {
        self.params
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Activate the output device and begin rendering.
    ///
    /// On failure the engine stays Stopped and the error is kept for
    /// `last_error`.
    pub fn start(&mut self) {
        if self.state == EngineState::Running {
            debug!("Synthesis engine already running");
            return;
        }

        // Fresh flag per voice so a stale callback can never be unsilenced
        let halted = Arc::new(AtomicBool::new(false));
        let (publisher, receiver) = param_channel(self.params);
        let mut voice = SynthVoice::new(receiver, Arc::clone(&halted), self.device.sample_rate(), &self.config);

        match self.device.start(Box::new(move || voice.next_frame())) {
            Ok(()) => {
                info!("Synthesis engine running at {} Hz", self.device.sample_rate());
                self.halted = halted;
                self.publisher = Some(publisher);
                self.state = EngineState::Running;
                self.last_error = None;
            }
            Err(e) => {
                error!("Failed to start audio output: {}", e);
                halted.store(true, Ordering::SeqCst);
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Silence the voice, then deactivate the device.
    ///
    /// The retained snapshot is muted, so a later `start` stays silent until
    /// the next update.
    pub fn stop(&mut self) {
        self.halted.store(true, Ordering::SeqCst);
        self.params = self.params.with_muted(true);
        if self.state == EngineState::Stopped {
            return;
        }
        if let Err(e) = self.device.stop() {
            warn!("Failed to stop audio output: {}", e);
            self.last_error = Some(e.to_string());
        }
        self.publisher = None;
        self.state = EngineState::Stopped;
        info!("Synthesis engine stopped");
    }

    /// Map a prediction to parameters and publish them
    pub fn update(&mut self, prediction: &Prediction, bpm: Option<f64>) {
        self.publish(map_parameters(prediction, bpm));
    }

    /// Override the mute flag on the current parameters
    pub fn set_muted(&mut self, muted: bool) {
        self.publish(self.params.with_muted(muted));
    }

    fn publish(&mut self, params: SynthParams) {
        self.params = params;
        if let Some(publisher) = self.publisher.as_mut() {
            publisher.publish(params);
        }
    }
}

impl<D: OutputDevice> Drop for SynthesisEngine<D> {
    fn drop(&mut self) {
        self.stop();
    }
}
