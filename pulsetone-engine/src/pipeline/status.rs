//! Display strings for the status lines and interpretation sentence

use pulsetone_common::Mood;

/// BPM is only shown when the estimate quality exceeds this
pub const DISPLAY_QUALITY_MIN: f64 = 0.2;

pub const NO_CONTACT_TEXT: &str =
    "No fingertip detected. Cover the rear camera and flash fully and hold still.";

pub const LOW_QUALITY_TEXT: &str =
    "Signal quality is low. Keep your finger steady and fully covering the camera and flash.";

pub const MEASURING_TEXT: &str =
    "Measuring... Typical resting is ~60–100 bpm. Athletes can be lower.";

/// `"HR: 72 bpm"`, or `"HR: -- bpm"` when the reading is absent or unreliable
pub fn heart_rate_label(bpm: Option<f64>, quality: f64) -> String {
    match bpm {
        Some(bpm) if quality > DISPLAY_QUALITY_MIN => format!("HR: {:.0} bpm", bpm),
        _ => "HR: -- bpm".to_string(),
    }
}

pub fn no_contact_heart_rate_label() -> String {
    "HR: 0 bpm".to_string()
}

/// `"Mood: Relaxed"`, or `"Mood: No contact"` without a mood
pub fn mood_label(mood: Option<Mood>) -> String {
    match mood {
        Some(mood) => format!("Mood: {}", mood.label()),
        None => "Mood: No contact".to_string(),
    }
}

pub fn contact_label(emitter_on: bool, in_contact: bool) -> String {
    format!(
        "Torch: {} • Contact: {}",
        if emitter_on { "On" } else { "Off" },
        if in_contact { "Yes" } else { "No" }
    )
}

/// Human-readable sentence keyed off BPM range and quality
pub fn interpretation_text(bpm: Option<f64>, quality: f64) -> String {
    if quality <= DISPLAY_QUALITY_MIN {
        return LOW_QUALITY_TEXT.to_string();
    }
    let Some(bpm) = bpm else {
        return MEASURING_TEXT.to_string();
    };
    format!(
        "Your estimated heart rate is {} bpm. {}",
        bpm.trunc() as i64,
        range_hint(bpm)
    )
}

fn range_hint(bpm: f64) -> &'static str {
    if bpm < 50.0 {
        "Lower than typical resting. If you feel unwell, consult a professional."
    } else if bpm < 60.0 {
        "On the lower side. Can be normal for well-trained individuals."
    } else if bpm <= 100.0 {
        "Within typical resting range for adults."
    } else if bpm <= 120.0 {
        "Slightly elevated. Movement, stress, or caffeine may raise it."
    } else {
        "High. Consider resting. If persistent and you feel unwell, seek advice."
    }
}
