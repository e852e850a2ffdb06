//! # Quality Assessment Entities
//!
//! Derived artifacts produced by the quality assessor: duplicate groups,
//! rule violations, improvement suggestions, and the assessment run that
//! produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{
    AssessmentId, Confidence, DuplicateGroupId, NormalizedItemId, SimilarityScore,
};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum ViolationKind {
    EmptyName,
    NonLatinInCode,
    CodeNotInTaxonomy,
    ConfidenceBelowFloor,
    MergedCountOfOneButMarkedMerged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub id: uuid::Uuid,
    pub normalized_item_id: NormalizedItemId,
    pub kind: ViolationKind,
    pub severity: Severity,
    pub detail: String,
    pub resolved: bool,
    pub resolved_by: Option<String>,
}

impl Violation {
    pub fn new(normalized_item_id: NormalizedItemId, kind: ViolationKind, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            normalized_item_id,
            kind,
            severity,
            detail: detail.into(),
            resolved: false,
            resolved_by: None,
        }
    }

    pub fn resolve(&mut self, resolver: impl Into<String>) {
        self.resolved = true;
        self.resolved_by = Some(resolver.into());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: uuid::Uuid,
    pub normalized_item_id: NormalizedItemId,
    pub suggested_name: String,
    pub suggested_code: String,
    pub confidence: Confidence,
    pub applied: bool,
}

impl Suggestion {
    pub fn new(
        normalized_item_id: NormalizedItemId,
        suggested_name: impl Into<String>,
        suggested_code: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            normalized_item_id,
            suggested_name: suggested_name.into(),
            suggested_code: suggested_code.into(),
            confidence,
            applied: false,
        }
    }

    pub fn mark_applied(&mut self) {
        self.applied = true;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub id: DuplicateGroupId,
    pub member_ids: Vec<NormalizedItemId>,
    pub suggested_master_id: NormalizedItemId,
    pub similarity: SimilarityScore,
}

impl DuplicateGroup {
    /// Chooses the suggested master as the member with the highest
    /// confidence, ties broken by lowest id — mirrors spec.md §4.7.
    pub fn new(
        members: Vec<(NormalizedItemId, Confidence)>,
        similarity: SimilarityScore,
    ) -> Option<Self> {
        if members.len() < 2 {
            return None;
        }
        let master = members
            .iter()
            .min_by(|(id_a, conf_a), (id_b, conf_b)| {
                conf_b
                    .value()
                    .partial_cmp(&conf_a.value())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| id_a.as_uuid().cmp(&id_b.as_uuid()))
            })
            .map(|(id, _)| *id)?;
        Some(Self {
            id: DuplicateGroupId::new(),
            member_ids: members.into_iter().map(|(id, _)| id).collect(),
            suggested_master_id: master,
            similarity,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub table: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rows_scanned: u64,
    pub duplicate_groups_found: u64,
    pub violations_found: u64,
    pub suggestions_found: u64,
}

impl Assessment {
    pub fn start(table: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: AssessmentId::new(),
            table: table.into(),
            started_at,
            completed_at: None,
            rows_scanned: 0,
            duplicate_groups_found: 0,
            violations_found: 0,
            suggestions_found: 0,
        }
    }

    pub fn complete(&mut self, completed_at: DateTime<Utc>) {
        self.completed_at = Some(completed_at);
    }
}
