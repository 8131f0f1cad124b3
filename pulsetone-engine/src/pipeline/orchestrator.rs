//! Sample loop sequencing
//!
//! For every accepted sample the orchestrator prunes the window, gates on
//! contact, emits a chart point and, on the configured cadence, runs one
//! estimation → classification → mapping cycle. A sustained contact loss
//! wipes the window so stale readings never mix with post-loss data; a
//! dropout of a sample or two does not.
//!
//! Display output goes out as `PulseEvent`s on a broadcast channel. Sending
//! with no subscribers is not an error.

use crate::audio::{EngineState, OutputDevice, SynthesisEngine};
use crate::classify::{MoodClassifier, Prediction};
use crate::pipeline::buffer::{Sample, SignalBuffer};
use crate::pipeline::status;
use crate::signal::{rmssd, BeatDetector, ContactGate, HeartRateEstimate};
use chrono::Utc;
use pulsetone_common::config::{OrchestratorConfig, PulsetoneConfig};
use pulsetone_common::events::{AudioState, PulseEvent};
use pulsetone_common::Mood;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

/// Events buffered per subscriber before it starts lagging
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// What one estimation cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum Cycle {
    /// In contact: full estimate, classified and mapped
    Measured {
        estimate: HeartRateEstimate,
        rmssd: f64,
        prediction: Prediction,
    },
    /// Out of contact: synth driven to mute
    NoContact,
}

pub struct Orchestrator<D: OutputDevice> {
    config: OrchestratorConfig,
    buffer: SignalBuffer,
    gate: ContactGate,
    detector: BeatDetector,
    classifier: MoodClassifier,
    engine: SynthesisEngine<D>,
    event_tx: broadcast::Sender<PulseEvent>,
    session_id: Uuid,
    active: bool,
    emitter_on: bool,
    in_contact: bool,
    /// Samples ingested this session; also the next chart index
    samples_seen: u64,
    /// Consecutive samples without contact
    no_contact_count: u32,
    last_estimate: Option<HeartRateEstimate>,
}

impl<D: OutputDevice> Orchestrator<D> {
    /// Build the pipeline from configuration around an output device
    pub fn new(config: &PulsetoneConfig, device: D) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config: config.orchestrator.clone(),
            buffer: SignalBuffer::new(config.orchestrator.window_sec),
            gate: ContactGate::new(config.contact.clone()),
            detector: BeatDetector::new(config.signal.clone(), config.detection.clone()),
            classifier: MoodClassifier::new(config.classifier.clone()),
            engine: SynthesisEngine::new(device, config.synth.clone()),
            event_tx,
            session_id: Uuid::new_v4(),
            active: false,
            emitter_on: false,
            in_contact: false,
            samples_seen: 0,
            no_contact_count: 0,
            last_estimate: None,
        }
    }

    /// Subscribe to display events
    pub fn subscribe(&self) -> broadcast::Receiver<PulseEvent> {
        self.event_tx.subscribe()
    }

    /// Begin a session: fresh window and chart index, audio started.
    ///
    /// The classifier keeps its centroids across sessions.
    pub fn start(&mut self) {
        self.session_id = Uuid::new_v4();
        self.buffer.clear();
        self.samples_seen = 0;
        self.no_contact_count = 0;
        self.in_contact = false;
        self.last_estimate = None;
        self.active = true;
        info!("Session {} started", self.session_id);

        self.engine.start();
        self.emit_audio_status();
    }

    /// End the session. The render path is silenced before sample intake
    /// halts; samples pushed afterwards are ignored.
    pub fn stop(&mut self) {
        self.engine.stop();
        self.active = false;
        self.emit_audio_status();
        info!(
            "Session {} stopped after {} samples",
            self.session_id, self.samples_seen
        );
    }

    /// Record an emitter (torch) on/off transition
    pub fn set_emitter(&mut self, on: bool) {
        if self.emitter_on == on {
            return;
        }
        self.emitter_on = on;
        info!("Emitter {}", if on { "on" } else { "off" });
        self.emit_contact_status();
    }

    /// Ingest one capture sample.
    ///
    /// Returns the cycle result when this sample landed on the estimation
    /// cadence, None otherwise (including for ignored samples).
    pub fn push_sample(&mut self, sample: Sample) -> Option<Cycle> {
        if !self.active {
            debug!("Session inactive, ignoring sample at {:.3}s", sample.timestamp);
            return None;
        }
        if !self.buffer.push(sample) {
            return None;
        }
        let sample_index = self.samples_seen;
        self.samples_seen += 1;

        let contact = self.gate.is_contact(self.buffer.values(), self.emitter_on);
        if contact {
            self.no_contact_count = 0;
        } else {
            self.no_contact_count += 1;
        }
        if contact != self.in_contact {
            self.in_contact = contact;
            info!("Contact {}", if contact { "acquired" } else { "lost" });
            self.emit_contact_status();
        }

        self.emit(PulseEvent::ChartPoint {
            session_id: self.session_id,
            sample_index,
            value: if contact { sample.intensity } else { 0.0 },
            timestamp: Utc::now(),
        });

        if !contact && self.no_contact_count >= self.config.reset_after_no_contact {
            self.reset_window();
        }

        if self.samples_seen % self.config.estimate_every == 0 {
            Some(self.run_cycle(contact))
        } else {
            None
        }
    }

    /// Cold restart after sustained contact loss
    fn reset_window(&mut self) {
        let discarded = self.buffer.clear();
        self.no_contact_count = 0;
        self.last_estimate = None;
        info!(
            "Contact lost for {} samples, discarded {} buffered samples",
            self.config.reset_after_no_contact, discarded
        );
        self.emit(PulseEvent::BufferReset {
            session_id: self.session_id,
            discarded_samples: discarded,
            timestamp: Utc::now(),
        });
    }

    fn run_cycle(&mut self, contact: bool) -> Cycle {
        if !contact {
            // Neutral prediction with zero BPM maps to a muted voice
            self.engine.update(
                &Prediction {
                    mood: Mood::Focused,
                    energy: 0.0,
                },
                Some(0.0),
            );
            self.emit_no_contact_status();
            return Cycle::NoContact;
        }

        let estimate = self
            .detector
            .estimate_heart_rate(self.buffer.timestamps(), self.buffer.values());
        let rmssd = rmssd(&estimate.rr_intervals);
        let prediction = self.classifier.classify(estimate.bpm, rmssd, estimate.quality);
        self.engine.update(&prediction, estimate.bpm);

        debug!(
            "Cycle at sample {}: bpm {:?}, quality {:.2}, rmssd {:.3}, mood {}, energy {:.2}",
            self.samples_seen, estimate.bpm, estimate.quality, rmssd, prediction.mood, prediction.energy
        );

        let timestamp = Utc::now();
        self.emit(PulseEvent::HeartRate {
            session_id: self.session_id,
            bpm: estimate.bpm,
            quality: estimate.quality,
            rmssd,
            label: status::heart_rate_label(estimate.bpm, estimate.quality),
            timestamp,
        });
        self.emit(PulseEvent::Interpretation {
            session_id: self.session_id,
            text: status::interpretation_text(estimate.bpm, estimate.quality),
            timestamp,
        });
        self.emit(PulseEvent::MoodChanged {
            session_id: self.session_id,
            mood: Some(prediction.mood),
            energy: prediction.energy,
            label: status::mood_label(Some(prediction.mood)),
            timestamp,
        });

        self.last_estimate = Some(estimate.clone());
        Cycle::Measured {
            estimate,
            rmssd,
            prediction,
        }
    }

    fn emit_no_contact_status(&self) {
        let timestamp = Utc::now();
        self.emit(PulseEvent::HeartRate {
            session_id: self.session_id,
            bpm: None,
            quality: 0.0,
            rmssd: 0.0,
            label: status::no_contact_heart_rate_label(),
            timestamp,
        });
        self.emit(PulseEvent::MoodChanged {
            session_id: self.session_id,
            mood: None,
            energy: 0.0,
            label: status::mood_label(None),
            timestamp,
        });
        self.emit(PulseEvent::Interpretation {
            session_id: self.session_id,
            text: status::NO_CONTACT_TEXT.to_string(),
            timestamp,
        });
    }

    fn emit_contact_status(&self) {
        self.emit(PulseEvent::ContactStatus {
            session_id: self.session_id,
            emitter_on: self.emitter_on,
            in_contact: self.in_contact,
            label: status::contact_label(self.emitter_on, self.in_contact),
            timestamp: Utc::now(),
        });
    }

    fn emit_audio_status(&self) {
        let state = match (self.engine.state(), self.engine.last_error()) {
            (EngineState::Running, _) => AudioState::Running,
            (EngineState::Stopped, Some(_)) => AudioState::Failed,
            (EngineState::Stopped, None) => AudioState::Stopped,
        };
        self.emit(PulseEvent::AudioStatus {
            session_id: self.session_id,
            state,
            detail: self.engine.last_error().map(str::to_string),
            timestamp: Utc::now(),
        });
    }

    fn emit(&self, event: PulseEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn in_contact(&self) -> bool {
        self.in_contact
    }

    pub fn emitter_on(&self) -> bool {
        self.emitter_on
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn buffer(&self) -> &SignalBuffer {
        &self.buffer
    }

    pub fn classifier(&self) -> &MoodClassifier {
        &self.classifier
    }

    /// Estimate from the latest in-contact cycle, cleared by a window reset
    pub fn last_estimate(&self) -> Option<&HeartRateEstimate> {
        self.last_estimate.as_ref()
    }

    pub fn engine(&self) -> &SynthesisEngine<D> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SynthesisEngine<D> {
        &mut self.engine
    }
}
