//! # Fingerprint Value Object
//!
//! A deterministic digest of a preprocessed catalog item name plus its
//! sorted structured attributes. Two items with equal fingerprints are
//! safe to merge without further similarity checks — see
//! `RefineClustering` in `catalog-engine`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Builds a fingerprint from a normalized (lower-cased, whitespace
    /// collapsed) name and a set of `key=value` structured attributes.
    /// Attributes are sorted before hashing so attribute order never
    /// affects the result.
    pub fn compute(normalized_name: &str, attributes: &[(String, String)]) -> Self {
        use sha2::{Digest, Sha256};

        let mut sorted = attributes.to_vec();
        sorted.sort();

        let mut hasher = Sha256::new();
        hasher.update(normalized_name.as_bytes());
        for (k, v) in &sorted {
            hasher.update(b"\0");
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
        }
        let digest = hasher.finalize();
        // 16 hex chars (64 bits) is plenty of collision resistance for a
        // dedup key and keeps the column narrow.
        let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
