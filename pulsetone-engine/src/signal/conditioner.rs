//! PPG signal conditioning
//!
//! Three passes over the raw intensity window:
//! 1. Causal moving-average detrend (removes ambient light and pressure drift)
//! 2. Single-pole exponential low-pass (suppresses sensor noise)
//! 3. Standardization to zero mean and unit variance
//!
//! The output has the same length as the input and comparable peak amplitude
//! across lighting conditions and skin tones.

use pulsetone_common::config::ConditionerConfig;

/// Stateless conditioner; every call is a pure function of its input
#[derive(Debug, Clone, Default)]
pub struct SignalConditioner {
    config: ConditionerConfig,
}

impl SignalConditioner {
    pub fn new(config: ConditionerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConditionerConfig {
        &self.config
    }

    /// Detrend, smooth and standardize a raw window.
    ///
    /// Returns an empty vector for empty input.
    pub fn condition(&self, raw: &[f64]) -> Vec<f64> {
        let detrended = detrend(raw, self.config.detrend_window);
        let smoothed = low_pass(&detrended, self.config.lowpass_alpha);
        standardize(&smoothed, self.config.variance_floor)
    }
}

/// Causal moving average over the `min(i + 1, window)` most recent samples.
///
/// Early samples average over a shrinking window instead of zero padding.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut result = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, &value) in values.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= values[i - window];
        }
        result.push(sum / (i + 1).min(window) as f64);
    }
    result
}

/// Subtract the causal moving average from each sample
pub fn detrend(values: &[f64], window: usize) -> Vec<f64> {
    values
        .iter()
        .zip(moving_average(values, window))
        .map(|(value, mean)| value - mean)
        .collect()
}

/// `out[i] = out[i-1] + alpha * (in[i] - out[i-1])`, seeded with `in[0]`
pub fn low_pass(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut output = Vec::with_capacity(values.len());
    let mut previous = match values.first() {
        Some(&first) => first,
        None => return output,
    };
    output.push(previous);
    for &value in &values[1..] {
        previous += alpha * (value - previous);
        output.push(previous);
    }
    output
}

/// Zero mean, unit (Bessel-corrected) variance.
///
/// The variance is floored so a flat window maps to zeros instead of NaN.
pub fn standardize(values: &[f64], variance_floor: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    let variance = sum_sq / (n - 1.0).max(1.0);
    let std = variance.max(variance_floor).sqrt();
    values.iter().map(|v| (v - mean) / std).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_shrinking_window() {
        let ma = moving_average(&[2.0, 4.0, 6.0, 8.0], 2);
        assert_eq!(ma, vec![2.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_moving_average_window_larger_than_input() {
        let ma = moving_average(&[3.0, 5.0, 7.0], 30);
        assert_eq!(ma, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_detrend_removes_constant_offset() {
        let detrended = detrend(&[100.0; 40], 30);
        assert!(detrended.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_low_pass_seeds_with_first_sample() {
        let out = low_pass(&[10.0, 0.0, 0.0], 0.5);
        assert_eq!(out, vec![10.0, 5.0, 2.5]);
    }

    #[test]
    fn test_low_pass_empty() {
        assert!(low_pass(&[], 0.2).is_empty());
    }

    #[test]
    fn test_standardize_unit_variance() {
        let out = standardize(&[1.0, 2.0, 3.0, 4.0, 5.0], 1e-9);
        let mean = out.iter().sum::<f64>() / out.len() as f64;
        let var = out.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (out.len() - 1) as f64;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_condition_constant_input_is_zero() {
        let conditioner = SignalConditioner::default();
        let out = conditioner.condition(&[150.0; 90]);
        assert_eq!(out.len(), 90);
        assert!(out.iter().all(|v| v.is_finite() && v.abs() < 1e-6));
    }

    #[test]
    fn test_condition_single_sample() {
        let conditioner = SignalConditioner::default();
        assert_eq!(conditioner.condition(&[42.0]), vec![0.0]);
    }

    #[test]
    fn test_condition_preserves_length() {
        let conditioner = SignalConditioner::default();
        let raw: Vec<f64> = (0..123).map(|i| (i as f64 * 0.3).sin() * 20.0 + 140.0).collect();
        assert_eq!(conditioner.condition(&raw).len(), raw.len());
    }
}
