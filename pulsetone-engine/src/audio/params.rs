//! Synthesizer parameters and their hand-off to the render thread
//!
//! `SynthParams` is a `Copy` snapshot. The control thread publishes whole
//! snapshots into a single lock-free slot and the audio callback picks up
//! whatever is newest. A publish overwrites anything the callback has not read
//! yet, so a mute can never queue behind stale snapshots, and a snapshot is
//! never observed half-written.

use crate::classify::Prediction;
use pulsetone_common::Mood;
use serde::Serialize;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Bounds on the heart-rate pitch ratio
const HR_RATIO_MIN: f64 = 0.8;
const HR_RATIO_MAX: f64 = 1.4;
/// BPM the heart-rate ratio is taken against
const HR_REFERENCE_BPM: f64 = 90.0;

const DELAY_TIME_MIN_SEC: f64 = 0.1;
const DELAY_TIME_MAX_SEC: f64 = 0.6;
/// Delay time used when no tempo is known
const DEFAULT_DELAY_TIME_SEC: f64 = 0.25;

/// Parameter snapshot read by the synthesis voice once per control block
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SynthParams {
    /// Main oscillator pitch in Hz before vibrato
    pub base_frequency: f64,
    /// Vibrato excursion in Hz
    pub vibrato_depth: f64,
    /// Output gain of the oscillator pair
    pub amplitude: f64,
    /// Reverb wet/dry balance, 0..1
    pub reverb_mix: f64,
    /// Delay wet/dry balance, 0..1
    pub delay_mix: f64,
    /// Delay line length in seconds
    pub delay_time: f64,
    /// Oscillator output forced to silence
    pub muted: bool,
}

impl Default for SynthParams {
    /// Focused voicing at rest, muted until the first estimate arrives
    fn default() -> Self {
        let voicing = MoodVoicing::for_mood(Mood::Focused);
        Self {
            base_frequency: voicing.base_pitch,
            vibrato_depth: 2.0,
            amplitude: 0.15,
            reverb_mix: voicing.reverb_mix,
            delay_mix: voicing.delay_mix,
            delay_time: DEFAULT_DELAY_TIME_SEC,
            muted: true,
        }
    }
}

impl SynthParams {
    /// Copy of these parameters with the mute flag replaced
    pub fn with_muted(self, muted: bool) -> Self {
        Self { muted, ..self }
    }
}

/// Per-mood pitch and effect balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodVoicing {
    pub base_pitch: f64,
    pub reverb_mix: f64,
    pub delay_mix: f64,
}

impl MoodVoicing {
    /// Relaxed sits lowest with the most diffusion, Excited highest with the least
    pub fn for_mood(mood: Mood) -> Self {
        match mood {
            // F3
            Mood::Relaxed => Self {
                base_pitch: 174.61,
                reverb_mix: 0.35,
                delay_mix: 0.10,
            },
            // A3
            Mood::Focused => Self {
                base_pitch: 220.0,
                reverb_mix: 0.25,
                delay_mix: 0.15,
            },
            // C4
            Mood::Excited => Self {
                base_pitch: 261.63,
                reverb_mix: 0.20,
                delay_mix: 0.20,
            },
        }
    }
}

/// Map a classifier prediction and measured BPM to synthesizer parameters.
///
/// An absent or zero BPM forces `muted = true` whatever the mood or energy.
/// Delay time follows half a quarter-note at the measured tempo.
pub fn map_parameters(prediction: &Prediction, bpm: Option<f64>) -> SynthParams {
    let voicing = MoodVoicing::for_mood(prediction.mood);
    let tempo = bpm.filter(|&b| b > 0.0);

    let hr_factor = (tempo.unwrap_or(HR_REFERENCE_BPM) / HR_REFERENCE_BPM).clamp(HR_RATIO_MIN, HR_RATIO_MAX);
    let delay_time = match tempo {
        Some(bpm) => (30.0 / bpm).clamp(DELAY_TIME_MIN_SEC, DELAY_TIME_MAX_SEC),
        None => DEFAULT_DELAY_TIME_SEC,
    };

    SynthParams {
        base_frequency: voicing.base_pitch * hr_factor,
        vibrato_depth: 0.5 + 4.0 * prediction.energy,
        amplitude: 0.12 + 0.18 * prediction.energy,
        reverb_mix: voicing.reverb_mix,
        delay_mix: voicing.delay_mix,
        delay_time,
        muted: tempo.is_none(),
    }
}

/// Number of words a snapshot occupies in the shared slot
const SLOT_WORDS: usize = 7;

/// Read attempts per poll before the render side keeps its previous snapshot
const MAX_READ_ATTEMPTS: usize = 4;

/// Single-writer sequence-locked cell holding the newest snapshot.
///
/// The sequence is odd while a write is in progress. Every word is an atomic,
/// so a reader racing the writer sees a changed sequence and discards what it
/// read instead of observing a torn snapshot.
struct ParamSlot {
    sequence: AtomicU64,
    words: [AtomicU64; SLOT_WORDS],
}

impl ParamSlot {
    fn new(initial: SynthParams) -> Self {
        Self {
            sequence: AtomicU64::new(0),
            words: encode(initial).map(AtomicU64::new),
        }
    }
}

fn encode(params: SynthParams) -> [u64; SLOT_WORDS] {
    [
        params.base_frequency.to_bits(),
        params.vibrato_depth.to_bits(),
        params.amplitude.to_bits(),
        params.reverb_mix.to_bits(),
        params.delay_mix.to_bits(),
        params.delay_time.to_bits(),
        u64::from(params.muted),
    ]
}

fn decode(words: [u64; SLOT_WORDS]) -> SynthParams {
    SynthParams {
        base_frequency: f64::from_bits(words[0]),
        vibrato_depth: f64::from_bits(words[1]),
        amplitude: f64::from_bits(words[2]),
        reverb_mix: f64::from_bits(words[3]),
        delay_mix: f64::from_bits(words[4]),
        delay_time: f64::from_bits(words[5]),
        muted: words[6] != 0,
    }
}

/// Create a connected publisher/receiver pair.
///
/// # Arguments
/// * `initial` - Parameters the receiver reports before the first publish
pub fn param_channel(initial: SynthParams) -> (ParamPublisher, ParamReceiver) {
    debug!("Creating parameter slot");
    let slot = Arc::new(ParamSlot::new(initial));
    (
        ParamPublisher {
            slot: Arc::clone(&slot),
            published: 0,
        },
        ParamReceiver {
            slot,
            seen: 0,
            current: initial,
        },
    )
}

/// Control-thread half of the parameter hand-off
pub struct ParamPublisher {
    slot: Arc<ParamSlot>,
    published: u64,
}

impl ParamPublisher {
    /// Replace the snapshot the render thread will pick up next.
    ///
    /// Never blocks and never fails: a snapshot the render thread has not
    /// read yet is overwritten, so the newest publish always wins.
    pub fn publish(&mut self, params: SynthParams) {
        let sequence = self.slot.sequence.load(Ordering::Relaxed);
        self.slot.sequence.store(sequence.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        for (word, value) in self.slot.words.iter().zip(encode(params)) {
            word.store(value, Ordering::Relaxed);
        }
        self.slot.sequence.store(sequence.wrapping_add(2), Ordering::Release);
        self.published += 1;
    }

    /// Snapshots published through this half
    pub fn published(&self) -> u64 {
        self.published
    }
}

/// Render-thread half of the parameter hand-off
///
/// **REAL-TIME SAFE**: polling only loads atomics; no locks, no allocation.
pub struct ParamReceiver {
    slot: Arc<ParamSlot>,
    seen: u64,
    current: SynthParams,
}

impl ParamReceiver {
    /// Pick up the newest published snapshot, if one arrived since the last poll
    pub fn poll(&mut self) -> SynthParams {
        for _ in 0..MAX_READ_ATTEMPTS {
            let before = self.slot.sequence.load(Ordering::Acquire);
            if before == self.seen {
                break;
            }
            if before & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }
            let words = std::array::from_fn(|i| self.slot.words[i].load(Ordering::Relaxed));
            fence(Ordering::Acquire);
            if self.slot.sequence.load(Ordering::Relaxed) == before {
                self.seen = before;
                self.current = decode(words);
                break;
            }
        }
        self.current
    }

    /// Latest snapshot seen by the last poll
    pub fn current(&self) -> SynthParams {
        self.current
    }
}
