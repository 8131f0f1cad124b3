//! # Pulsetone Engine
//!
//! Optical pulse measurement driving a generative audio texture.
//!
//! **Purpose:** Condition a camera-derived PPG signal, detect heartbeats,
//! classify a coarse mood online and re-parameterize a real-time synthesizer
//! from the result.
//!
//! **Architecture:** Synchronous control path (`pipeline`) feeding a lock-free
//! render path (`audio`) through a single latest-value parameter slot.

pub mod audio;
pub mod capture;
pub mod classify;
pub mod error;
pub mod pipeline;
pub mod signal;

pub use error::{Error, Result};
pub use pipeline::{Orchestrator, Sample};
