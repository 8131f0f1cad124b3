//! Capture sources feeding the pipeline

pub mod simulator;

pub use simulator::SimulatedCapture;
