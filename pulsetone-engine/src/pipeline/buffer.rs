//! Rolling sample window
//!
//! Timestamps and intensities are stored as parallel columns so the signal
//! stages can borrow them as plain slices.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One capture reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Capture-clock time in seconds, monotonic
    pub timestamp: f64,
    /// Raw red-channel intensity
    pub intensity: f64,
}

impl Sample {
    pub fn new(timestamp: f64, intensity: f64) -> Self {
        Self { timestamp, intensity }
    }
}

/// Time-bounded, timestamp-ordered sample buffer.
///
/// Invariant: `timestamps` is non-decreasing and spans at most `window_sec`
/// after every push.
#[derive(Debug, Clone)]
pub struct SignalBuffer {
    timestamps: Vec<f64>,
    values: Vec<f64>,
    window_sec: f64,
}

impl SignalBuffer {
    pub fn new(window_sec: f64) -> Self {
        Self {
            timestamps: Vec::new(),
            values: Vec::new(),
            window_sec,
        }
    }

    /// Append a sample and prune anything older than the window.
    ///
    /// Returns false (and keeps the buffer unchanged) for a sample older than
    /// the newest one already buffered.
    pub fn push(&mut self, sample: Sample) -> bool {
        if let Some(&last) = self.timestamps.last() {
            if sample.timestamp < last {
                warn!(
                    "Dropping out-of-order sample at {:.3}s (newest is {:.3}s)",
                    sample.timestamp, last
                );
                return false;
            }
        }
        self.timestamps.push(sample.timestamp);
        self.values.push(sample.intensity);
        self.prune();
        true
    }

    /// Drop leading samples more than `window_sec` older than the newest
    fn prune(&mut self) {
        let Some(&newest) = self.timestamps.last() else {
            return;
        };
        let expired = self
            .timestamps
            .iter()
            .take_while(|&&t| newest - t > self.window_sec)
            .count();
        if expired > 0 {
            self.timestamps.drain(..expired);
            self.values.drain(..expired);
        }
    }

    /// Wipe the buffer, returning how many samples were discarded
    pub fn clear(&mut self) -> usize {
        let discarded = self.values.len();
        self.timestamps.clear();
        self.values.clear();
        discarded
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Seconds between the oldest and newest buffered sample
    pub fn span(&self) -> f64 {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds_span() {
        let mut buffer = SignalBuffer::new(15.0);
        for i in 0..900 {
            buffer.push(Sample::new(i as f64 * 0.25, 150.0));
        }
        assert!(buffer.span() <= 15.0);
        // 15 s at 4 Hz, inclusive of both ends
        assert_eq!(buffer.len(), 61);
        assert_eq!(buffer.timestamps().len(), buffer.values().len());
    }

    #[test]
    fn test_out_of_order_sample_rejected() {
        let mut buffer = SignalBuffer::new(15.0);
        assert!(buffer.push(Sample::new(1.0, 150.0)));
        assert!(!buffer.push(Sample::new(0.5, 151.0)));
        assert!(buffer.push(Sample::new(1.0, 152.0)));
        assert_eq!(buffer.values(), &[150.0, 152.0]);
    }

    #[test]
    fn test_clear_reports_discarded() {
        let mut buffer = SignalBuffer::new(15.0);
        for i in 0..10 {
            buffer.push(Sample::new(i as f64, 1.0));
        }
        assert_eq!(buffer.clear(), 10);
        assert!(buffer.is_empty());
        assert_eq!(buffer.span(), 0.0);
    }

    #[test]
    fn test_gap_prunes_everything_but_newest() {
        let mut buffer = SignalBuffer::new(15.0);
        buffer.push(Sample::new(0.0, 1.0));
        buffer.push(Sample::new(1.0, 1.0));
        buffer.push(Sample::new(100.0, 2.0));
        assert_eq!(buffer.values(), &[2.0]);
    }
}
