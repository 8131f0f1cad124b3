//! Mood classes produced by the online classifier

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse affective state inferred from physiology.
///
/// The discriminant order matches the centroid order of the classifier:
/// index 0 is Relaxed, 1 is Focused, 2 is Excited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Low heart rate, high beat-to-beat variability
    Relaxed,
    /// Mid heart rate, moderate variability
    Focused,
    /// High heart rate, low variability
    Excited,
}

impl Mood {
    /// All moods in centroid order
    pub const ALL: [Mood; 3] = [Mood::Relaxed, Mood::Focused, Mood::Excited];

    /// Map a winning centroid index to its mood.
    ///
    /// Any index past the last centroid maps to Excited.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Mood::Relaxed,
            1 => Mood::Focused,
            _ => Mood::Excited,
        }
    }

    /// Centroid index for this mood
    pub fn index(self) -> usize {
        match self {
            Mood::Relaxed => 0,
            Mood::Focused => 1,
            Mood::Excited => 2,
        }
    }

    /// Capitalized label for display
    pub fn label(self) -> &'static str {
        match self {
            Mood::Relaxed => "Relaxed",
            Mood::Focused => "Focused",
            Mood::Excited => "Excited",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for mood in Mood::ALL {
            assert_eq!(Mood::from_index(mood.index()), mood);
        }
    }

    #[test]
    fn test_out_of_range_index_is_excited() {
        assert_eq!(Mood::from_index(7), Mood::Excited);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Mood::Relaxed).unwrap();
        assert_eq!(json, "\"relaxed\"");
    }
}
