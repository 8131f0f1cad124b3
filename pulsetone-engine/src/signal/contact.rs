//! Fingertip contact heuristic
//!
//! A covered, illuminated camera reads bright and steady on the red channel.
//! This gate decides whether estimation should run at all; it says nothing
//! about whether the resulting estimate is statistically reliable.
//!
//! The thresholds assume an 8-bit channel at one exposure setting and are not
//! normalized against exposure or ISO.

use pulsetone_common::config::ContactConfig;

#[derive(Debug, Clone, Default)]
pub struct ContactGate {
    config: ContactConfig,
}

impl ContactGate {
    pub fn new(config: ContactConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContactConfig {
        &self.config
    }

    /// Evaluate contact over the most recent raw samples.
    ///
    /// # Arguments
    /// * `values` - Raw intensity history, oldest first; only the last
    ///   `config.window` entries are inspected
    /// * `emitter_on` - Whether the light emitter is active
    ///
    /// Requires at least `config.min_samples` recent samples and an active
    /// emitter, then `mean > min_mean` and population `std < max_std`.
    pub fn is_contact(&self, values: &[f64], emitter_on: bool) -> bool {
        let window = values.len().min(self.config.window);
        if window < self.config.min_samples || !emitter_on {
            return false;
        }
        let recent = &values[values.len() - window..];
        let n = window as f64;
        let mean = recent.iter().sum::<f64>() / n;
        let variance = recent.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let std = variance.max(0.0).sqrt();
        mean > self.config.min_mean && std < self.config.max_std
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bright_steady_signal_is_contact() {
        let gate = ContactGate::default();
        let values: Vec<f64> = (0..25).map(|i| 150.0 + (i % 5) as f64).collect();
        assert!(gate.is_contact(&values, true));
    }

    #[test]
    fn test_emitter_off_is_never_contact() {
        let gate = ContactGate::default();
        assert!(!gate.is_contact(&[150.0; 25], false));
    }

    #[test]
    fn test_too_few_samples() {
        let gate = ContactGate::default();
        assert!(!gate.is_contact(&[150.0; 14], true));
        assert!(gate.is_contact(&[150.0; 15], true));
    }

    #[test]
    fn test_dark_signal_is_not_contact() {
        let gate = ContactGate::default();
        assert!(!gate.is_contact(&[110.0; 25], true));
    }

    #[test]
    fn test_noisy_signal_is_not_contact() {
        let gate = ContactGate::default();
        let values: Vec<f64> = (0..25).map(|i| if i % 2 == 0 { 100.0 } else { 200.0 }).collect();
        assert!(!gate.is_contact(&values, true));
    }

    #[test]
    fn test_only_recent_window_counts() {
        let gate = ContactGate::default();
        // Old dark samples fall outside the 25-sample window
        let mut values = vec![20.0; 100];
        values.extend(std::iter::repeat(160.0).take(25));
        assert!(gate.is_contact(&values, true));
    }
}
