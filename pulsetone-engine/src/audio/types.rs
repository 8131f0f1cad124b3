//! Core audio data types
//!
//! The synthesized texture is mono; frames are duplicated to every output
//! channel by the device layer.

/// AudioFrame represents a single stereo sample (one frame of audio).
///
/// Used for passing audio data between the synthesis voice and the output device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    /// Left channel sample
    pub left: f32,

    /// Right channel sample
    pub right: f32,
}

impl AudioFrame {
    /// Create a silent frame (0.0, 0.0)
    pub fn zero() -> Self {
        AudioFrame { left: 0.0, right: 0.0 }
    }

    /// Create a frame from mono sample (duplicate to both channels)
    pub fn from_mono(sample: f32) -> Self {
        AudioFrame { left: sample, right: sample }
    }

    /// Clamp samples to valid range [-1.0, 1.0] to prevent clipping
    pub fn clamp(&mut self) {
        self.left = self.left.clamp(-1.0, 1.0);
        self.right = self.right.clamp(-1.0, 1.0);
    }

    /// Whether both channels are exactly zero
    pub fn is_silent(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_frame_zero() {
        let frame = AudioFrame::zero();
        assert!(frame.is_silent());
    }

    #[test]
    fn test_audio_frame_from_mono() {
        let frame = AudioFrame::from_mono(0.5);
        assert_eq!(frame.left, 0.5);
        assert_eq!(frame.right, 0.5);
    }

    #[test]
    fn test_audio_frame_clamp() {
        let mut frame = AudioFrame::from_mono(1.5);
        frame.clamp();
        assert_eq!(frame.left, 1.0);
        assert_eq!(frame.right, 1.0);
    }
}
