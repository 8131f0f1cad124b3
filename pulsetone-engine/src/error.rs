//! Error types for pulsetone-engine
//!
//! Only device and file plumbing produce errors. Insufficient or
//! out-of-range physiology is represented in the estimate itself.

use thiserror::Error;

/// Main error type for the engine crate
#[derive(Error, Debug)]
pub enum Error {
    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// WAV rendering errors
    #[error("WAV write error: {0}")]
    WavWrite(#[from] hound::Error),
}

/// Convenience Result type using the engine Error
pub type Result<T> = std::result::Result<T, Error>;
