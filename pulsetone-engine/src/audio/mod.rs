//! Real-time synthesis and audio output

pub mod effects;
pub mod engine;
pub mod offline;
pub mod output;
pub mod params;
pub mod synth;
pub mod types;

pub use engine::{EngineState, SynthesisEngine};
pub use offline::{OfflineOutput, WavSink};
pub use output::{AudioOutput, OutputDevice, RenderCallback};
pub use params::{map_parameters, SynthParams};
pub use synth::SynthVoice;
pub use types::AudioFrame;
