//! # Similarity Score Value Object

use serde::{Deserialize, Serialize};
use std::fmt;

/// A hybrid similarity score between two catalog item names, in `[0.0,
/// 1.0]`. See `SimilarityWeights` for how the four component signals are
/// combined.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SimilarityScore(f32);

impl SimilarityScore {
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn meets(&self, threshold: f32) -> bool {
        self.0 >= threshold
    }
}

impl fmt::Display for SimilarityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Weights applied to the four component similarity signals. Must sum to
/// `1.0` (validated by `AppConfig` on load in `catalog-engine`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub token_jaccard: f32,
    pub edit_distance: f32,
    pub phonetic: f32,
    pub attribute_overlap: f32,
}

impl SimilarityWeights {
    pub fn sum(&self) -> f32 {
        self.token_jaccard + self.edit_distance + self.phonetic + self.attribute_overlap
    }

    pub fn is_valid(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-3
    }
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            token_jaccard: 0.4,
            edit_distance: 0.3,
            phonetic: 0.1,
            attribute_overlap: 0.2,
        }
    }
}
