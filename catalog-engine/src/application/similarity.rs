//! # Hybrid Similarity Service
//!
//! Implements the domain's `FingerprintService` and `SimilarityService`
//! seams (spec.md §4.2): fingerprinting is a thin pass-through to the
//! value object, and the hybrid similarity score combines token Jaccard,
//! normalized edit distance, first-token phonetic equivalence, and fixed-
//! key attribute overlap, each weighted per `SimilarityWeights`. Every
//! call to `similarity` is routed through the process-wide
//! `SimilarityCache` so concurrent callers on the same pair share one
//! computation.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use catalog_domain::services::{FingerprintService, SimilarityCandidate, SimilarityService};
use catalog_domain::value_objects::{Fingerprint, SimilarityScore, SimilarityWeights};

use crate::infrastructure::similarity_cache::SimilarityCache;

/// Attribute keys that factor into the attribute-overlap component,
/// per spec.md §4.2.
const OVERLAP_KEYS: [&str; 2] = ["unit", "size"];

pub struct HybridSimilarityService {
    cache: Arc<SimilarityCache>,
    weights: SimilarityWeights,
}

impl HybridSimilarityService {
    pub fn new(cache: Arc<SimilarityCache>, weights: SimilarityWeights) -> Self {
        Self { cache, weights }
    }

    /// Strips whitespace and punctuation, keeping only alphanumerics, so
    /// spacing/hyphenation conventions ("м10х30" vs "м10 х 30") don't
    /// fracture otherwise-identical names into different token streams.
    fn normalize_chars(name: &str) -> String {
        name.chars().filter(|c| c.is_alphanumeric()).flat_map(|c| c.to_lowercase()).collect()
    }

    fn char_trigrams(normalized: &str) -> HashSet<String> {
        let chars: Vec<char> = normalized.chars().collect();
        if chars.len() < 3 {
            return if chars.is_empty() {
                HashSet::new()
            } else {
                let only: String = chars.iter().collect();
                HashSet::from([only])
            };
        }
        (0..=chars.len() - 3).map(|i| chars[i..i + 3].iter().collect()).collect()
    }

    /// Jaccard similarity over character trigrams of the punctuation-
    /// stripped names, rather than whitespace-split words — robust to the
    /// spacing/hyphenation drift common in near-duplicate catalog entries.
    fn token_jaccard(a: &str, b: &str) -> f32 {
        let ga = Self::char_trigrams(&Self::normalize_chars(a));
        let gb = Self::char_trigrams(&Self::normalize_chars(b));
        if ga.is_empty() && gb.is_empty() {
            return 1.0;
        }
        let intersection = ga.intersection(&gb).count();
        let union = ga.union(&gb).count();
        if union == 0 {
            0.0
        } else {
            intersection as f32 / union as f32
        }
    }

    /// Levenshtein distance over the punctuation-stripped names, normalized
    /// to a [0,1] similarity.
    fn edit_similarity(a: &str, b: &str) -> f32 {
        let a: Vec<char> = Self::normalize_chars(a).chars().collect();
        let b: Vec<char> = Self::normalize_chars(b).chars().collect();
        let (la, lb) = (a.len(), b.len());
        if la == 0 && lb == 0 {
            return 1.0;
        }
        let mut prev: Vec<usize> = (0..=lb).collect();
        let mut curr = vec![0usize; lb + 1];
        for i in 1..=la {
            curr[0] = i;
            for j in 1..=lb {
                let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
                curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            }
            std::mem::swap(&mut prev, &mut curr);
        }
        let distance = prev[lb];
        let max_len = la.max(lb).max(1);
        1.0 - (distance as f32 / max_len as f32)
    }

    /// Crude first-token phonetic key: initial consonant-skeleton of the
    /// first token, good enough to catch transliteration variance
    /// ("болт" vs "bolt"-style spellings) without a dedicated crate.
    fn phonetic_key(token: &str) -> String {
        token
            .chars()
            .filter(|c| !"aeiouаеёиоуыэюя".contains(c.to_ascii_lowercase()))
            .flat_map(|c| c.to_lowercase())
            .collect()
    }

    fn phonetic_match(a: &str, b: &str) -> f32 {
        let first_a = a.split_whitespace().next().unwrap_or("");
        let first_b = b.split_whitespace().next().unwrap_or("");
        if Self::phonetic_key(first_a) == Self::phonetic_key(first_b) {
            1.0
        } else {
            0.0
        }
    }

    /// Only keys asserted by at least one side count as "compared" — a
    /// pair with no attribute data on either side has no contradicting
    /// evidence, so it scores neutral (1.0) rather than being penalized
    /// for a signal neither side ever populated.
    fn attribute_overlap(a: &[(String, String)], b: &[(String, String)]) -> f32 {
        let mut compared = 0usize;
        let mut matched = 0usize;
        for key in OVERLAP_KEYS {
            let va = a.iter().find(|(k, _)| k == key).map(|(_, v)| v);
            let vb = b.iter().find(|(k, _)| k == key).map(|(_, v)| v);
            if va.is_none() && vb.is_none() {
                continue;
            }
            compared += 1;
            if matches!((va, vb), (Some(va), Some(vb)) if va.eq_ignore_ascii_case(vb)) {
                matched += 1;
            }
        }
        if compared == 0 {
            1.0
        } else {
            matched as f32 / compared as f32
        }
    }

    fn compute_raw(&self, a: &SimilarityCandidate, b: &SimilarityCandidate) -> SimilarityScore {
        let w = &self.weights;
        let score = w.token_jaccard * Self::token_jaccard(&a.normalized_name, &b.normalized_name)
            + w.edit_distance * Self::edit_similarity(&a.normalized_name, &b.normalized_name)
            + w.phonetic * Self::phonetic_match(&a.normalized_name, &b.normalized_name)
            + w.attribute_overlap * Self::attribute_overlap(&a.attributes, &b.attributes);
        SimilarityScore::new(score)
    }
}

impl FingerprintService for HybridSimilarityService {
    fn compute(&self, normalized_name: &str, attributes: &[(String, String)]) -> Fingerprint {
        Fingerprint::compute(normalized_name, attributes)
    }
}

#[async_trait]
impl SimilarityService for HybridSimilarityService {
    async fn similarity(&self, a: &SimilarityCandidate, b: &SimilarityCandidate) -> SimilarityScore {
        let a = a.clone();
        let b = b.clone();
        self.cache
            .get_or_compute(&a, &b, || async move { self.compute_raw(&a, &b) })
            .await
    }
}
