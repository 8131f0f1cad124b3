//! Measurements over rendered audio frames

use pulsetone_engine::audio::AudioFrame;

/// RMS of the left channel
pub fn rms(frames: &[AudioFrame]) -> f32 {
    if frames.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = frames.iter().map(|f| f.left * f.left).sum();
    (sum_sq / frames.len() as f32).sqrt()
}

/// Every frame exactly zero on both channels
pub fn is_silent(frames: &[AudioFrame]) -> bool {
    frames.iter().all(AudioFrame::is_silent)
}
