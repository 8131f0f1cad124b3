//! Insert effects: feedback delay followed by a hall reverb
//!
//! Both stages preallocate their delay lines at construction so the render
//! path never allocates. Mix and delay time are set from the parameter
//! snapshot; feedback and reverb tuning are fixed.

/// Comb delay lengths in samples at 44.1 kHz (Freeverb tuning)
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
/// Allpass delay lengths in samples at 44.1 kHz
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
const TUNING_SAMPLE_RATE: f64 = 44100.0;

/// Large-hall room size (comb feedback)
const HALL_ROOM_SIZE: f32 = 0.84;
/// High-frequency damping inside the combs
const HALL_DAMPING: f32 = 0.2;
const ALLPASS_FEEDBACK: f32 = 0.5;
/// Input attenuation ahead of the parallel combs
const REVERB_INPUT_GAIN: f32 = 0.015;
/// Make-up gain on the wet reverb signal
const REVERB_WET_GAIN: f32 = 3.0;

/// Delay line with feedback and wet/dry mix
#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
    feedback: f32,
    mix: f32,
    sample_rate: f64,
}

impl FeedbackDelay {
    /// Creates a delay able to reach `max_delay_sec`.
    ///
    /// # Arguments
    /// * `sample_rate` - Output sample rate in Hz
    /// * `max_delay_sec` - Longest delay that will ever be requested
    /// * `feedback` - Portion of the delayed signal fed back, in [0, 1)
    pub fn new(sample_rate: f64, max_delay_sec: f64, feedback: f32) -> Self {
        let capacity = ((sample_rate * max_delay_sec).ceil() as usize).max(2);
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            delay_samples: 1,
            feedback: feedback.clamp(0.0, 0.99),
            mix: 0.0,
            sample_rate,
        }
    }

    /// Set delay time in seconds, limited to the allocated line
    pub fn set_delay_time(&mut self, seconds: f64) {
        let samples = (seconds * self.sample_rate).round() as usize;
        self.delay_samples = samples.clamp(1, self.buffer.len() - 1);
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    /// Wet/dry balance, 0 = dry only
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    /// Processes a single sample.
    pub fn process(&mut self, input: f32) -> f32 {
        let len = self.buffer.len();
        let read_pos = (self.write_pos + len - self.delay_samples) % len;
        let delayed = self.buffer[read_pos];
        self.buffer[self.write_pos] = input + delayed * self.feedback;
        self.write_pos = (self.write_pos + 1) % len;
        input * (1.0 - self.mix) + delayed * self.mix
    }
}

/// Feedback comb with one-pole damping in the loop
#[derive(Debug, Clone)]
struct DampedComb {
    buffer: Vec<f32>,
    pos: usize,
    filter_store: f32,
}

impl DampedComb {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            pos: 0,
            filter_store: 0.0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.pos];
        self.filter_store = output * (1.0 - HALL_DAMPING) + self.filter_store * HALL_DAMPING;
        self.buffer[self.pos] = input + self.filter_store * HALL_ROOM_SIZE;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

/// Schroeder allpass diffuser
#[derive(Debug, Clone)]
struct Allpass {
    buffer: Vec<f32>,
    pos: usize,
}

impl Allpass {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            pos: 0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        let output = delayed - input;
        self.buffer[self.pos] = input + delayed * ALLPASS_FEEDBACK;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

/// Mono hall reverb: parallel damped combs into series allpasses
#[derive(Debug, Clone)]
pub struct HallReverb {
    combs: Vec<DampedComb>,
    allpasses: Vec<Allpass>,
    mix: f32,
}

impl HallReverb {
    pub fn new(sample_rate: f64) -> Self {
        let scale = sample_rate / TUNING_SAMPLE_RATE;
        let scaled = |len: usize| ((len as f64) * scale).round() as usize;
        Self {
            combs: COMB_TUNING.iter().map(|&len| DampedComb::new(scaled(len))).collect(),
            allpasses: ALLPASS_TUNING.iter().map(|&len| Allpass::new(scaled(len))).collect(),
            mix: 0.0,
        }
    }

    /// Wet/dry balance, 0 = dry only
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    /// Processes a single sample.
    pub fn process(&mut self, input: f32) -> f32 {
        let feed = input * REVERB_INPUT_GAIN;
        let mut wet: f32 = self.combs.iter_mut().map(|comb| comb.process(feed)).sum();
        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }
        input * (1.0 - self.mix) + wet * REVERB_WET_GAIN * self.mix
    }
}

/// Fixed two-stage insert chain: delay, then reverb
#[derive(Debug, Clone)]
pub struct EffectsChain {
    delay: FeedbackDelay,
    reverb: HallReverb,
}

impl EffectsChain {
    pub fn new(sample_rate: f64, max_delay_sec: f64, delay_feedback: f32) -> Self {
        Self {
            delay: FeedbackDelay::new(sample_rate, max_delay_sec, delay_feedback),
            reverb: HallReverb::new(sample_rate),
        }
    }

    /// Apply mix and time settings from a parameter snapshot
    pub fn configure(&mut self, delay_time: f64, delay_mix: f64, reverb_mix: f64) {
        self.delay.set_delay_time(delay_time);
        self.delay.set_mix(delay_mix as f32);
        self.reverb.set_mix(reverb_mix as f32);
    }

    pub fn delay(&self) -> &FeedbackDelay {
        &self.delay
    }

    pub fn process(&mut self, input: f32) -> f32 {
        self.reverb.process(self.delay.process(input))
    }
}
