//! Event types emitted by the measurement pipeline for display front-ends

use crate::Mood;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pulsetone event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PulseEvent {
    /// One live-plot point: raw intensity while in contact, 0 otherwise
    ChartPoint {
        session_id: Uuid,
        sample_index: u64,
        value: f64,
        timestamp: DateTime<Utc>,
    },

    /// Heart-rate estimate from one estimation cycle
    HeartRate {
        session_id: Uuid,
        bpm: Option<f64>,
        quality: f64,
        rmssd: f64,
        /// Display string, e.g. "HR: 72 bpm"
        label: String,
        timestamp: DateTime<Utc>,
    },

    /// Classifier output; `mood` is None while out of contact
    MoodChanged {
        session_id: Uuid,
        mood: Option<Mood>,
        energy: f64,
        /// Display string, e.g. "Mood: Relaxed"
        label: String,
        timestamp: DateTime<Utc>,
    },

    /// Emitter or contact state changed
    ContactStatus {
        session_id: Uuid,
        emitter_on: bool,
        in_contact: bool,
        /// Display string, e.g. "Torch: On • Contact: Yes"
        label: String,
        timestamp: DateTime<Utc>,
    },

    /// Human-readable interpretation of the latest reading
    Interpretation {
        session_id: Uuid,
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// Sustained contact loss wiped the signal buffer
    BufferReset {
        session_id: Uuid,
        discarded_samples: usize,
        timestamp: DateTime<Utc>,
    },

    /// Synthesis engine state changed or a device error was swallowed
    AudioStatus {
        session_id: Uuid,
        state: AudioState,
        detail: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

/// Externally visible synthesis engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioState {
    /// Output device inactive
    Stopped,
    /// Output device pulling samples
    Running,
    /// Last start/stop attempt failed; audio degraded to silence
    Failed,
}

impl PulseEvent {
    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            PulseEvent::ChartPoint { session_id, .. }
            | PulseEvent::HeartRate { session_id, .. }
            | PulseEvent::MoodChanged { session_id, .. }
            | PulseEvent::ContactStatus { session_id, .. }
            | PulseEvent::Interpretation { session_id, .. }
            | PulseEvent::BufferReset { session_id, .. }
            | PulseEvent::AudioStatus { session_id, .. } => *session_id,
        }
    }

    /// Status line for text front-ends; chart points have none
    pub fn display_text(&self) -> Option<String> {
        match self {
            PulseEvent::ChartPoint { .. } => None,
            PulseEvent::HeartRate { label, .. }
            | PulseEvent::MoodChanged { label, .. }
            | PulseEvent::ContactStatus { label, .. } => Some(label.clone()),
            PulseEvent::Interpretation { text, .. } => Some(text.clone()),
            PulseEvent::BufferReset { discarded_samples, .. } => Some(format!(
                "Contact lost, discarded {} buffered samples",
                discarded_samples
            )),
            PulseEvent::AudioStatus { state, detail, .. } => Some(match detail {
                Some(detail) => format!("Audio: {:?} ({})", state, detail),
                None => format!("Audio: {:?}", state),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = PulseEvent::MoodChanged {
            session_id: Uuid::nil(),
            mood: Some(Mood::Focused),
            energy: 0.5,
            label: "Mood: Focused".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "MoodChanged");
        assert_eq!(json["mood"], "focused");
    }

    #[test]
    fn test_chart_point_has_no_display_text() {
        let event = PulseEvent::ChartPoint {
            session_id: Uuid::nil(),
            sample_index: 3,
            value: 150.0,
            timestamp: Utc::now(),
        };
        assert!(event.display_text().is_none());
    }

    #[test]
    fn test_audio_status_text_includes_detail() {
        let event = PulseEvent::AudioStatus {
            session_id: Uuid::nil(),
            state: AudioState::Failed,
            detail: Some("no device".to_string()),
            timestamp: Utc::now(),
        };
        assert_eq!(event.display_text().unwrap(), "Audio: Failed (no device)");
    }
}
