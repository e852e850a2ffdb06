//! # Priority and Channel Count Value Objects
//!
//! Small bounded newtypes used by the AI orchestrator's provider registry,
//! mirroring the teacher's practice of wrapping primitive worker/resource
//! counts in their own validated types rather than passing bare `usize`.

use serde::{Deserialize, Serialize};

/// Relative ordering used by the `Priority` provider-selection strategy.
/// Lower values are tried first.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Priority(u32);

impl Priority {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(100)
    }
}

/// Number of concurrent in-flight requests a provider may serve, backing
/// its semaphore in `catalog-engine`'s orchestrator.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChannelCount(usize);

impl ChannelCount {
    pub fn new(value: usize) -> Self {
        Self(value.max(1))
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl Default for ChannelCount {
    fn default() -> Self {
        Self(4)
    }
}
