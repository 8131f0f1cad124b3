//! Configuration loading and resolution
//!
//! Every tunable of the measurement pipeline lives here with a built-in default,
//! so an empty or absent config file reproduces the stock behaviour.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PULSETONE_CONFIG`)
//! 3. Platform config directory (`<config_dir>/pulsetone/config.toml`)
//! 4. Built-in defaults (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PULSETONE_CONFIG";

/// Top-level configuration, one section per pipeline stage
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PulsetoneConfig {
    pub signal: ConditionerConfig,
    pub detection: DetectorConfig,
    pub contact: ContactConfig,
    pub classifier: ClassifierConfig,
    pub orchestrator: OrchestratorConfig,
    pub synth: SynthConfig,
    pub capture: CaptureConfig,
    pub logging: LoggingConfig,
}

/// Detrend, low-pass and standardization settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConditionerConfig {
    /// Causal moving-average window in samples (~1 s at 30 Hz)
    pub detrend_window: usize,
    /// Exponential low-pass coefficient, in (0, 1]
    pub lowpass_alpha: f64,
    /// Floor applied to the variance before standardizing
    pub variance_floor: f64,
}

impl Default for ConditionerConfig {
    fn default() -> Self {
        Self {
            detrend_window: 30,
            lowpass_alpha: 0.2,
            variance_floor: 1e-9,
        }
    }
}

/// Peak detection and heart-rate estimation settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum raw samples before an estimate is attempted
    pub min_samples: usize,
    /// Refractory period between accepted peaks (0.33 s caps at ~182 BPM)
    pub min_peak_distance_sec: f64,
    /// Adaptive threshold as a fraction of the conditioned signal RMS
    pub threshold_factor: f64,
    /// Exclusive lower bound on a valid RR interval (240 BPM)
    pub min_rr_sec: f64,
    /// Exclusive upper bound on a valid RR interval (30 BPM)
    pub max_rr_sec: f64,
    /// Peaks required before a BPM is reported
    pub min_peaks: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_samples: 60,
            min_peak_distance_sec: 0.33,
            threshold_factor: 0.3,
            min_rr_sec: 0.25,
            max_rr_sec: 2.0,
            min_peaks: 3,
        }
    }
}

/// Finger-contact heuristic settings.
///
/// Tuned for an 8-bit red channel at one exposure setting; there is no
/// normalization against exposure or ISO.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContactConfig {
    /// Most recent raw samples inspected
    pub window: usize,
    /// Samples required before contact can be reported
    pub min_samples: usize,
    /// Mean intensity must exceed this
    pub min_mean: f64,
    /// Standard deviation must stay below this
    pub max_std: f64,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            window: 25,
            min_samples: 15,
            min_mean: 110.0,
            max_std: 30.0,
        }
    }
}

/// Online mood classifier settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Seed centroids as [bpm, rmssd, quality] for Relaxed, Focused, Excited
    pub seeds: [[f64; 3]; 3],
    /// EMA step toward each observation won by a centroid
    pub learning_rate: f64,
    /// BPM substituted when no heart rate is available
    pub fallback_bpm: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            seeds: [[60.0, 0.08, 0.8], [85.0, 0.05, 0.7], [115.0, 0.02, 0.7]],
            learning_rate: 0.1,
            fallback_bpm: 80.0,
        }
    }
}

/// Sequencing settings for the sample loop
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Rolling buffer span in seconds
    pub window_sec: f64,
    /// Run one estimation cycle every N ingested samples
    pub estimate_every: u64,
    /// Consecutive no-contact samples before the buffer is wiped
    pub reset_after_no_contact: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            window_sec: 15.0,
            estimate_every: 15,
            reset_after_no_contact: 30,
        }
    }
}

/// Synthesis engine settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthConfig {
    /// Output device name (None = system default)
    pub device: Option<String>,
    /// Sample rate for offline rendering; live output uses the device rate
    pub sample_rate: u32,
    /// Vibrato oscillator rate in Hz
    pub vibrato_rate_hz: f64,
    /// Frames rendered between parameter polls
    pub control_block_frames: usize,
    /// Longest delay line the feedback delay allocates, in seconds
    pub max_delay_sec: f64,
    /// Feedback of the delay stage, 0..1
    pub delay_feedback: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: 44100,
            vibrato_rate_hz: 5.5,
            control_block_frames: 64,
            max_delay_sec: 1.0,
            delay_feedback: 0.2,
        }
    }
}

/// Simulated capture settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frames per second delivered by the capture source
    pub frame_rate: f64,
    /// Heart rate of the simulated subject
    pub simulated_bpm: f64,
    /// RNG seed for reproducible sessions
    pub seed: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            simulated_bpm: 72.0,
            seed: 7,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PulsetoneConfig {
    /// Resolve and load configuration.
    ///
    /// An explicitly named file (CLI or environment) must exist and parse.
    /// The platform default location is optional.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_path {
            return Self::load_from_file(path);
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load_from_file(Path::new(&path));
        }

        // Priority 3: Platform config directory
        if let Some(path) = default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
            debug!("No config file at {}", path.display());
        }

        // Priority 4: Built-in defaults
        info!("Using built-in configuration defaults");
        Ok(Self::default())
    }

    /// Load and validate a TOML config file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.signal.detrend_window == 0 {
            return Err(Error::Config("signal.detrend_window must be positive".into()));
        }
        if !(self.signal.lowpass_alpha > 0.0 && self.signal.lowpass_alpha <= 1.0) {
            return Err(Error::Config(format!(
                "signal.lowpass_alpha must be in (0, 1], got {}",
                self.signal.lowpass_alpha
            )));
        }
        if self.detection.min_peak_distance_sec < 0.0 {
            return Err(Error::Config("detection.min_peak_distance_sec must not be negative".into()));
        }
        if self.detection.min_rr_sec >= self.detection.max_rr_sec {
            return Err(Error::Config("detection.min_rr_sec must be below max_rr_sec".into()));
        }
        if self.contact.window == 0 || self.contact.min_samples > self.contact.window {
            return Err(Error::Config(
                "contact.min_samples must be positive and no larger than contact.window".into(),
            ));
        }
        if !(self.classifier.learning_rate > 0.0 && self.classifier.learning_rate <= 1.0) {
            return Err(Error::Config("classifier.learning_rate must be in (0, 1]".into()));
        }
        if self.orchestrator.window_sec <= 0.0 {
            return Err(Error::Config("orchestrator.window_sec must be positive".into()));
        }
        if self.orchestrator.estimate_every == 0 {
            return Err(Error::Config("orchestrator.estimate_every must be positive".into()));
        }
        if self.orchestrator.reset_after_no_contact == 0 {
            return Err(Error::Config("orchestrator.reset_after_no_contact must be positive".into()));
        }
        if self.synth.sample_rate == 0 {
            return Err(Error::Config("synth.sample_rate must be positive".into()));
        }
        if self.synth.control_block_frames == 0 {
            return Err(Error::Config("synth.control_block_frames must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.synth.delay_feedback) {
            return Err(Error::Config("synth.delay_feedback must be in [0, 1)".into()));
        }
        if self.capture.frame_rate <= 0.0 {
            return Err(Error::Config("capture.frame_rate must be positive".into()));
        }
        Ok(())
    }
}

/// Platform location of the implicit config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pulsetone").join("config.toml"))
}
