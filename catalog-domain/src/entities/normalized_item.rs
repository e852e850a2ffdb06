//! # NormalizedItem Entity
//!
//! The pipeline's working and output row. A `NormalizedItem` starts life as
//! soon as an item passes Preprocess and accumulates stage completion as
//! the pipeline engine advances it; once `final_completed` is set it is the
//! finished, queryable normalized group member.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::value_objects::{CatalogItemId, Confidence, NormalizedItemId, ProcessingLevel};

/// Per-stage completion bits and timestamps, named to match the twelve
/// pipeline stages in order. Field names intentionally mirror the
/// half-step numbering the pipeline uses for stages that were inserted
/// between originally-numbered stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageFlags {
    pub stage05_completed: bool,
    pub stage05_at: Option<DateTime<Utc>>,
    pub stage1_completed: bool,
    pub stage1_at: Option<DateTime<Utc>>,
    pub stage2_completed: bool,
    pub stage2_at: Option<DateTime<Utc>>,
    pub stage25_completed: bool,
    pub stage25_at: Option<DateTime<Utc>>,
    pub stage3_completed: bool,
    pub stage3_at: Option<DateTime<Utc>>,
    pub stage3_group_id: Option<String>,
    pub stage35_completed: bool,
    pub stage35_at: Option<DateTime<Utc>>,
    pub stage4_completed: bool,
    pub stage4_at: Option<DateTime<Utc>>,
    pub stage5_completed: bool,
    pub stage5_at: Option<DateTime<Utc>>,
    pub stage6_completed: bool,
    pub stage6_at: Option<DateTime<Utc>>,
    pub stage65_completed: bool,
    pub stage65_at: Option<DateTime<Utc>>,
    pub stage7_ai_processed: bool,
    pub stage7_at: Option<DateTime<Utc>>,
    pub stage8_completed: bool,
    pub stage8_at: Option<DateTime<Utc>>,
    pub stage9_completed: bool,
    pub stage9_at: Option<DateTime<Utc>>,
    pub final_completed: bool,
    pub final_at: Option<DateTime<Utc>>,
    /// Most recent per-item error message, if any stage failed for this
    /// item. Does not abort the stage (see `CatalogError` propagation
    /// policy).
    pub last_error: Option<String>,

    /// Type-detect's routing decision (`good` / `service` / `counterparty`).
    pub item_type: Option<String>,
    /// Attribute-extract's parsed key/value map, JSON-encoded so later
    /// stages can reload it without re-touching the source `CatalogItem`.
    pub extracted_attributes_json: Option<String>,
    /// Article-extract's deterministic article/SKU match, if any.
    pub article_code: Option<String>,
    /// Dimension-extract's parsed size/unit pairs, JSON-encoded.
    pub dimensions_json: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedItem {
    id: NormalizedItemId,
    source_item_id: CatalogItemId,
    source_reference: String,
    normalized_name: String,
    normalized_reference: String,
    category_label: Option<String>,
    merged_count: u32,
    taxonomy_code: Option<String>,
    taxonomy_name: Option<String>,
    confidence: Confidence,
    processing_level: ProcessingLevel,
    ai_reasoning: Option<String>,
    stages: StageFlags,
}

impl NormalizedItem {
    pub fn new(
        source_item_id: CatalogItemId,
        source_reference: impl Into<String>,
        normalized_name: impl Into<String>,
        normalized_reference: impl Into<String>,
    ) -> Self {
        Self {
            id: NormalizedItemId::new(),
            source_item_id,
            source_reference: source_reference.into(),
            normalized_name: normalized_name.into(),
            normalized_reference: normalized_reference.into(),
            category_label: None,
            merged_count: 1,
            taxonomy_code: None,
            taxonomy_name: None,
            confidence: Confidence::ZERO,
            processing_level: ProcessingLevel::Basic,
            ai_reasoning: None,
            stages: StageFlags::default(),
        }
    }

    /// Reconstructs a `NormalizedItem` from stored state, for repository
    /// adapters reading a row back. Bypasses the `classify`/`finalize`
    /// invariant checks since the row was already validated on write.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: NormalizedItemId,
        source_item_id: CatalogItemId,
        source_reference: String,
        normalized_name: String,
        normalized_reference: String,
        category_label: Option<String>,
        merged_count: u32,
        taxonomy_code: Option<String>,
        taxonomy_name: Option<String>,
        confidence: Confidence,
        processing_level: ProcessingLevel,
        ai_reasoning: Option<String>,
        stages: StageFlags,
    ) -> Self {
        Self {
            id,
            source_item_id,
            source_reference,
            normalized_name,
            normalized_reference,
            category_label,
            merged_count,
            taxonomy_code,
            taxonomy_name,
            confidence,
            processing_level,
            ai_reasoning,
            stages,
        }
    }

    pub fn id(&self) -> NormalizedItemId {
        self.id
    }

    pub fn source_item_id(&self) -> CatalogItemId {
        self.source_item_id
    }

    pub fn source_reference(&self) -> &str {
        &self.source_reference
    }

    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    pub fn set_normalized_name(&mut self, name: impl Into<String>) {
        self.normalized_name = name.into();
    }

    pub fn normalized_reference(&self) -> &str {
        &self.normalized_reference
    }

    pub fn set_normalized_reference(&mut self, reference: impl Into<String>) {
        self.normalized_reference = reference.into();
    }

    pub fn merged_count(&self) -> u32 {
        self.merged_count
    }

    pub fn set_merged_count(&mut self, count: u32) {
        self.merged_count = count;
    }

    pub fn taxonomy_code(&self) -> Option<&str> {
        self.taxonomy_code.as_deref()
    }

    pub fn taxonomy_name(&self) -> Option<&str> {
        self.taxonomy_name.as_deref()
    }

    pub fn category_label(&self) -> Option<&str> {
        self.category_label.as_deref()
    }

    pub fn ai_reasoning(&self) -> Option<&str> {
        self.ai_reasoning.as_deref()
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn processing_level(&self) -> ProcessingLevel {
        self.processing_level
    }

    pub fn stages(&self) -> &StageFlags {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut StageFlags {
        &mut self.stages
    }

    pub fn is_final(&self) -> bool {
        self.stages.final_completed
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.stages.last_error = Some(message.into());
    }

    /// Applies a classification result, enforcing the invariant that
    /// `processing_level` only increases across pipeline runs.
    pub fn classify(
        &mut self,
        code: impl Into<String>,
        name: impl Into<String>,
        confidence: Confidence,
        level: ProcessingLevel,
        reasoning: Option<String>,
    ) -> Result<(), CatalogError> {
        if !self.processing_level.can_transition_to(level) {
            return Err(CatalogError::validation(format!(
                "processing level may not regress from {} to {} for item {}",
                self.processing_level, level, self.id
            )));
        }
        self.taxonomy_code = Some(code.into());
        self.taxonomy_name = Some(name.into());
        self.confidence = confidence;
        self.processing_level = level;
        self.ai_reasoning = reasoning;
        Ok(())
    }

    /// Clears a taxonomy assignment that `ValidateCode` found does not
    /// resolve to an existing `ClassifierNode`, without touching
    /// `processing_level` (which never regresses).
    pub fn invalidate_classification(&mut self) {
        self.taxonomy_code = None;
        self.taxonomy_name = None;
        self.confidence = Confidence::ZERO;
        self.ai_reasoning = None;
    }

    pub fn finalize(&mut self, category_label: Option<String>, at: DateTime<Utc>) {
        self.category_label = category_label;
        self.stages.stage9_completed = true;
        self.stages.stage9_at = Some(at);
        self.stages.final_completed = true;
        self.stages.final_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_level_cannot_regress() {
        let mut item = NormalizedItem::new(CatalogItemId::new(), "A1", "bolt", "bolt|m10");
        item.classify("25.94.11", "bolt", Confidence::new(0.9), ProcessingLevel::AiEnhanced, None)
            .unwrap();
        let result = item.classify(
            "25.94.11",
            "bolt",
            Confidence::new(0.5),
            ProcessingLevel::Basic,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn finalize_sets_final_flag() {
        let mut item = NormalizedItem::new(CatalogItemId::new(), "A1", "bolt", "bolt|m10");
        assert!(!item.is_final());
        item.finalize(Some("fasteners".into()), Utc::now());
        assert!(item.is_final());
    }
}
