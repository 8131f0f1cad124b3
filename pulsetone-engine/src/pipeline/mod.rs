//! Sample intake, sequencing and display status

pub mod buffer;
pub mod orchestrator;
pub mod status;

pub use buffer::{Sample, SignalBuffer};
pub use orchestrator::{Cycle, Orchestrator};
