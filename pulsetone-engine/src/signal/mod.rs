//! Signal path: conditioning, beat detection and contact gating
//!
//! All stages are synchronous and operate on read-only slices of the
//! orchestrator's buffer.

pub mod beat_detector;
pub mod conditioner;
pub mod contact;

pub use beat_detector::{rmssd, BeatDetector, HeartRateEstimate};
pub use conditioner::SignalConditioner;
pub use contact::ContactGate;
