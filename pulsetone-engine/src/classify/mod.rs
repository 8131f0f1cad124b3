//! Online mood classifier
//!
//! Three-cluster nearest-centroid learner over `[bpm, rmssd, quality]`.
//! Centroids are seeded with archetypal relaxed/focused/excited physiology and
//! then nudged toward every observation they win, with no batch re-clustering
//! and no re-seeding. Long-term drift toward one user's physiology is expected.
//!
//! The classifier is an owned instance; tests construct independent ones with
//! their own seeds.

use pulsetone_common::config::ClassifierConfig;
use pulsetone_common::Mood;
use serde::Serialize;
use tracing::trace;

/// Feature vector: [bpm, rmssd, quality]
pub type Features = [f64; 3];

/// One cluster representative
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Centroid {
    pub features: Features,
    /// Observations absorbed, counting the seed as one
    pub update_count: u64,
}

/// Classifier output for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub mood: Mood,
    /// Synthesis intensity in [0, 1], independent of the cluster assignment
    pub energy: f64,
}

#[derive(Debug, Clone)]
pub struct MoodClassifier {
    centroids: [Centroid; 3],
    learning_rate: f64,
    fallback_bpm: f64,
}

impl Default for MoodClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl MoodClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let centroids = config.seeds.map(|features| Centroid {
            features,
            update_count: 1,
        });
        Self {
            centroids,
            learning_rate: config.learning_rate,
            fallback_bpm: config.fallback_bpm,
        }
    }

    /// Read-only view of the centroids in mood order
    pub fn centroids(&self) -> &[Centroid; 3] {
        &self.centroids
    }

    /// Classify one observation and adapt the winning centroid.
    ///
    /// A missing BPM is replaced with the configured neutral value so the
    /// other two features still count.
    pub fn classify(&mut self, bpm: Option<f64>, rmssd: f64, quality: f64) -> Prediction {
        let hr = bpm.unwrap_or(self.fallback_bpm);
        let feature = [hr, rmssd, quality];

        let index = self.nearest_centroid(&feature);
        self.update_centroid(index, &feature);

        let normalized_hr = ((hr - 50.0) / 80.0).clamp(0.0, 1.0);
        Prediction {
            mood: Mood::from_index(index),
            energy: 0.7 * normalized_hr + 0.3 * quality,
        }
    }

    /// Index of the closest centroid; ties go to the lower index
    fn nearest_centroid(&self, feature: &Features) -> usize {
        let mut best_index = 0;
        let mut best_distance = f64::INFINITY;
        for (i, centroid) in self.centroids.iter().enumerate() {
            let distance = squared_distance(&centroid.features, feature);
            if distance < best_distance {
                best_distance = distance;
                best_index = i;
            }
        }
        best_index
    }

    fn update_centroid(&mut self, index: usize, feature: &Features) {
        let lr = self.learning_rate;
        let centroid = &mut self.centroids[index];
        for (c, f) in centroid.features.iter_mut().zip(feature) {
            *c += lr * (f - *c);
        }
        centroid.update_count += 1;
        trace!(
            "Centroid {} -> {:?} after {} updates",
            index,
            centroid.features,
            centroid.update_count
        );
    }
}

/// Squared Euclidean distance over the three features
pub fn squared_distance(a: &Features, b: &Features) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
