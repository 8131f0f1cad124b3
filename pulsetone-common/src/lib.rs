//! # Pulsetone Common Library
//!
//! Shared code for the pulsetone engine and any front-end:
//! - Error type
//! - Configuration file model and resolution
//! - Mood enumeration
//! - Display event types (PulseEvent enum)

pub mod config;
pub mod error;
pub mod events;
pub mod mood;

pub use config::PulsetoneConfig;
pub use error::{Error, Result};
pub use events::PulseEvent;
pub use mood::Mood;
