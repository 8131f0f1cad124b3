//! Offline output device
//!
//! Pulls frames on demand instead of from a hardware clock. Used for WAV
//! rendering and for driving the synthesis engine deterministically in tests.

use crate::audio::output::{OutputDevice, RenderCallback};
use crate::audio::AudioFrame;
use crate::error::{Error, Result};
use std::path::Path;
use tracing::{debug, info};

pub struct OfflineOutput {
    sample_rate: u32,
    callback: Option<RenderCallback>,
    frames_rendered: u64,
}

impl OfflineOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            callback: None,
            frames_rendered: 0,
        }
    }

    /// Whether a render callback is installed
    pub fn is_running(&self) -> bool {
        self.callback.is_some()
    }

    /// Total frames pulled since construction
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Pull `frames` frames from the installed callback.
    ///
    /// A stopped device produces silence, the same as a paused stream.
    pub fn render(&mut self, frames: usize) -> Vec<AudioFrame> {
        let mut out = Vec::with_capacity(frames);
        match self.callback.as_mut() {
            Some(callback) => out.extend((0..frames).map(|_| callback())),
            None => out.resize(frames, AudioFrame::zero()),
        }
        self.frames_rendered += frames as u64;
        out
    }
}

impl OutputDevice for OfflineOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, callback: RenderCallback) -> Result<()> {
        if self.callback.is_some() {
            return Err(Error::InvalidState("Offline output already started".to_string()));
        }
        debug!("Offline output started at {} Hz", self.sample_rate);
        self.callback = Some(callback);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.callback = None;
        Ok(())
    }
}

/// Writes rendered frames as a mono 32-bit float WAV.
pub struct WavSink {
    writer: hound::WavWriter<std::io::BufWriter<std::fs::File>>,
    frames: u64,
}

impl WavSink {
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let writer = hound::WavWriter::create(path, spec)?;
        info!("Rendering to {}", path.display());
        Ok(Self { writer, frames: 0 })
    }

    pub fn write(&mut self, frames: &[AudioFrame]) -> Result<()> {
        for frame in frames {
            self.writer.write_sample(frame.left)?;
        }
        self.frames += frames.len() as u64;
        Ok(())
    }

    /// Flush the header and return the number of frames written
    pub fn finalize(self) -> Result<u64> {
        self.writer.finalize()?;
        Ok(self.frames)
    }
}
