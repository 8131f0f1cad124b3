//! Heartbeat detection and heart-rate estimation
//!
//! Streaming peak-domain estimator: local maxima above an adaptive threshold,
//! a refractory period between accepted peaks, and a physiological bound on
//! the resulting RR intervals. No spectral estimation.
//!
//! Every estimate is recomputed from scratch over the current window.

use crate::signal::conditioner::SignalConditioner;
use pulsetone_common::config::{ConditionerConfig, DetectorConfig};
use serde::Serialize;
use tracing::{debug, trace};

/// Quality reported when peaks were found but every interval was out of range
const NO_VALID_INTERVAL_QUALITY: f64 = 0.2;

/// Quality ceiling while too few peaks were found
const FEW_PEAKS_QUALITY_CAP: f64 = 0.3;

/// Floor on the mean square of the conditioned signal before taking its root
const RMS_FLOOR: f64 = 1e-6;

/// Result of one estimation cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRateEstimate {
    /// Beats per minute; None when there is not enough evidence
    pub bpm: Option<f64>,
    /// Confidence in [0, 1]
    pub quality: f64,
    /// Valid beat-to-beat intervals in seconds, in detection order
    pub rr_intervals: Vec<f64>,
}

impl HeartRateEstimate {
    /// Insufficient-data result: no BPM, zero quality
    pub fn insufficient() -> Self {
        Self {
            bpm: None,
            quality: 0.0,
            rr_intervals: Vec::new(),
        }
    }

    fn low_confidence(quality: f64) -> Self {
        Self {
            bpm: None,
            quality,
            rr_intervals: Vec::new(),
        }
    }
}

/// Peak detector plus estimator, owning its conditioning stage
#[derive(Debug, Clone, Default)]
pub struct BeatDetector {
    conditioner: SignalConditioner,
    config: DetectorConfig,
}

impl BeatDetector {
    pub fn new(conditioner: ConditionerConfig, config: DetectorConfig) -> Self {
        Self {
            conditioner: SignalConditioner::new(conditioner),
            config,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Estimate heart rate from a raw intensity window.
    ///
    /// # Arguments
    /// * `timestamps` - Capture times in seconds, non-decreasing
    /// * `raw_signal` - Unconditioned intensities, same length as `timestamps`
    ///
    /// Mismatched lengths are a caller bug: they panic in debug builds and
    /// yield the insufficient-data result in release builds.
    pub fn estimate_heart_rate(&self, timestamps: &[f64], raw_signal: &[f64]) -> HeartRateEstimate {
        debug_assert_eq!(
            timestamps.len(),
            raw_signal.len(),
            "timestamps and samples must be the same length"
        );
        if raw_signal.len() != timestamps.len() || raw_signal.len() < self.config.min_samples {
            return HeartRateEstimate::insufficient();
        }
        // Unreachable when min_samples >= 1, but an empty window must not index below
        let (first_ts, last_ts) = match (timestamps.first(), timestamps.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return HeartRateEstimate::insufficient(),
        };

        let normalized = self.conditioner.condition(raw_signal);

        let mean_square = normalized.iter().map(|v| v * v).sum::<f64>() / normalized.len() as f64;
        let rms = mean_square.max(RMS_FLOOR).sqrt();
        let threshold = self.config.threshold_factor * rms;

        let peaks = detect_peaks(
            &normalized,
            timestamps,
            self.config.min_peak_distance_sec,
            threshold,
        );
        trace!("Detected {} peaks (threshold {:.3})", peaks.len(), threshold);

        if peaks.len() < self.config.min_peaks {
            let quality = FEW_PEAKS_QUALITY_CAP.min(peaks.len() as f64 / self.config.min_peaks as f64);
            return HeartRateEstimate::low_confidence(quality);
        }

        let intervals: Vec<f64> = peaks
            .windows(2)
            .map(|pair| timestamps[pair[1]] - timestamps[pair[0]])
            .filter(|&dt| dt > self.config.min_rr_sec && dt < self.config.max_rr_sec)
            .collect();

        if intervals.is_empty() {
            return HeartRateEstimate::low_confidence(NO_VALID_INTERVAL_QUALITY);
        }

        let mean_interval = intervals.iter().sum::<f64>() / intervals.len() as f64;
        let bpm = 60.0 / mean_interval;

        // Consistency rewards evenly spaced beats across the whole window
        let duration = last_ts - first_ts;
        let expected_peaks = ((duration / mean_interval).floor() as usize).max(1);
        let consistency = (peaks.len() as f64 / expected_peaks as f64).min(1.0);
        let quality = (0.5 * consistency + 0.5 * rms.min(1.0)).clamp(0.0, 1.0);

        debug!(
            "Estimate: {:.1} bpm, quality {:.2}, {} peaks, {} intervals",
            bpm,
            quality,
            peaks.len(),
            intervals.len()
        );

        HeartRateEstimate {
            bpm: Some(bpm),
            quality,
            rr_intervals: intervals,
        }
    }
}

/// Find heartbeat peaks.
///
/// Index `i` (endpoints excluded) is a candidate when it is strictly greater
/// than both neighbours and than `threshold`. A candidate closer than
/// `min_distance_sec` to the last accepted peak is dropped; the first peak in a
/// refractory window wins even if a taller one follows.
///
/// Returns indices in ascending order. Mismatched lengths or fewer than three
/// samples yield no peaks.
pub fn detect_peaks(
    values: &[f64],
    timestamps: &[f64],
    min_distance_sec: f64,
    threshold: f64,
) -> Vec<usize> {
    if values.len() != timestamps.len() || values.len() < 3 {
        return Vec::new();
    }

    let mut peaks = Vec::new();
    let mut last_peak_time: Option<f64> = None;

    for i in 1..values.len() - 1 {
        let is_peak = values[i] > values[i - 1] && values[i] > values[i + 1] && values[i] > threshold;
        if !is_peak {
            continue;
        }
        let t = timestamps[i];
        let clear_of_refractory = match last_peak_time {
            Some(last) => t - last >= min_distance_sec,
            None => true,
        };
        if clear_of_refractory {
            peaks.push(i);
            last_peak_time = Some(t);
        }
    }
    peaks
}

/// Root mean square of successive interval differences.
///
/// Returns 0 for fewer than two intervals.
pub fn rmssd(intervals: &[f64]) -> f64 {
    if intervals.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = intervals
        .windows(2)
        .map(|pair| {
            let diff = pair[1] - pair[0];
            diff * diff
        })
        .sum();
    (sum_sq / (intervals.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamps(n: usize, fs: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 / fs).collect()
    }

    #[test]
    fn test_detect_peaks_simple() {
        let values = [0.0, 1.0, 0.0, 2.0, 0.0];
        let ts = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(detect_peaks(&values, &ts, 0.5, 0.5), vec![1, 3]);
    }

    #[test]
    fn test_detect_peaks_threshold_excludes_small() {
        let values = [0.0, 0.2, 0.0, 2.0, 0.0];
        let ts = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(detect_peaks(&values, &ts, 0.5, 0.5), vec![3]);
    }

    #[test]
    fn test_detect_peaks_first_in_refractory_wins() {
        // Taller peak 0.2 s after the first is suppressed
        let values = [0.0, 1.0, 0.0, 5.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let ts = timestamps(values.len(), 10.0);
        assert_eq!(detect_peaks(&values, &ts, 0.33, 0.5), vec![1, 7]);
    }

    #[test]
    fn test_detect_peaks_excludes_endpoints_and_plateaus() {
        let values = [3.0, 1.0, 2.0, 2.0, 1.0, 3.0];
        let ts = timestamps(values.len(), 1.0);
        assert!(detect_peaks(&values, &ts, 0.0, 0.0).is_empty());
    }

    #[test]
    fn test_detect_peaks_mismatched_lengths() {
        assert!(detect_peaks(&[0.0, 1.0, 0.0], &[0.0, 1.0], 0.1, 0.0).is_empty());
    }

    #[test]
    fn test_estimate_insufficient_samples() {
        let detector = BeatDetector::default();
        let ts = timestamps(59, 30.0);
        let raw = vec![150.0; 59];
        assert_eq!(detector.estimate_heart_rate(&ts, &raw), HeartRateEstimate::insufficient());
    }

    #[test]
    fn test_estimate_flat_signal_has_no_bpm() {
        let detector = BeatDetector::default();
        let ts = timestamps(300, 30.0);
        let raw = vec![150.0; 300];
        let estimate = detector.estimate_heart_rate(&ts, &raw);
        assert!(estimate.bpm.is_none());
        assert_eq!(estimate.quality, 0.0);
        assert!(estimate.rr_intervals.is_empty());
    }

    #[test]
    fn test_estimate_sine_pulse() {
        // 60 BPM sine, peaks offset from sample midpoints
        let fs = 30.0;
        let ts = timestamps(450, fs);
        let raw: Vec<f64> = ts
            .iter()
            .map(|t| 150.0 + 30.0 * (2.0 * std::f64::consts::PI * (t - 0.05)).sin())
            .collect();
        let estimate = BeatDetector::default().estimate_heart_rate(&ts, &raw);
        let bpm = estimate.bpm.expect("bpm for clean pulse");
        assert!((bpm - 60.0).abs() < 2.0, "bpm {}", bpm);
        assert!(estimate.quality > 0.9);
    }

    #[test]
    fn test_rmssd_values() {
        assert_eq!(rmssd(&[]), 0.0);
        assert_eq!(rmssd(&[0.8]), 0.0);
        let value = rmssd(&[0.8, 0.9, 0.8]);
        assert!((value - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_rmssd_constant_intervals_is_zero() {
        assert_eq!(rmssd(&[0.75; 10]), 0.0);
    }
}
