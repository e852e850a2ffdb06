//! # Processing Level Value Object
//!
//! Records which mechanism ultimately produced a `NormalizedItem`'s
//! classification. Ordered so that `processing_level` can be checked for
//! monotonic increase across pipeline runs (a testable property of the
//! normalization pipeline): a later run may only strengthen the evidence
//! behind a row's classification, never weaken it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ProcessingLevel {
    /// Resolved by deterministic rules alone (algorithmic classify, no
    /// refinement).
    Basic,
    /// Resolved after refinement/validation of a deterministic candidate.
    Enhanced,
    /// Resolved via the AI orchestrator.
    AiEnhanced,
    /// Resolved via benchmark short-circuit (similarity >= threshold
    /// against a known-good prior classification) — the strongest
    /// evidence, since it corresponds to a human-curated reference.
    Benchmark,
}

impl ProcessingLevel {
    /// Whether moving from `self` to `next` respects the monotonic
    /// strengthening invariant.
    pub fn can_transition_to(&self, next: ProcessingLevel) -> bool {
        next >= *self
    }
}

impl fmt::Display for ProcessingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Basic => "basic",
            Self::Enhanced => "enhanced",
            Self::AiEnhanced => "ai_enhanced",
            Self::Benchmark => "benchmark",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ProcessingLevel {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "enhanced" => Ok(Self::Enhanced),
            "ai_enhanced" => Ok(Self::AiEnhanced),
            "benchmark" => Ok(Self::Benchmark),
            other => Err(CatalogError::validation(format!("unknown processing level: {other}"))),
        }
    }
}
