//! # Refine Clustering Stage
//!
//! Merges near-duplicate groups within a batch (spec.md §4.1 step 6,
//! §4.2): two groups merge when the hybrid similarity of their
//! representative names is `>= refine_cluster_threshold` (default 0.85).
//! Overrides `run_batch` rather than `apply`, since clustering is
//! inherently a whole-batch operation, not a per-item one — see
//! `StageService::run_batch`'s default-but-overridable contract.
//!
//! Clustering here is scoped to the current batch: two groups that never
//! land in the same `pipeline_batch_size` window will not be merged by
//! this stage. Revisiting a wider, store-wide refinement pass is future
//! work; see `DESIGN.md`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::error::CatalogError;
use catalog_domain::services::{SimilarityCandidate, SimilarityService, StageBatch, StageOutcome, StageService};

pub struct RefineClusteringStage {
    similarity: Arc<dyn SimilarityService>,
    threshold: f32,
}

impl RefineClusteringStage {
    pub fn new(similarity: Arc<dyn SimilarityService>, threshold: f32) -> Self {
        Self { similarity, threshold }
    }

    fn attributes(item: &NormalizedItem) -> Vec<(String, String)> {
        item.stages()
            .extracted_attributes_json
            .as_deref()
            .and_then(|json| serde_json::from_str::<std::collections::HashMap<String, String>>(json).ok())
            .map(|map| map.into_iter().collect())
            .unwrap_or_default()
    }

    fn find(parent: &mut HashMap<String, String>, key: &str) -> String {
        let mut root = key.to_string();
        while let Some(next) = parent.get(&root) {
            if next == &root {
                break;
            }
            root = next.clone();
        }
        root
    }

    fn union(parent: &mut HashMap<String, String>, a: &str, b: &str) {
        let root_a = Self::find(parent, a);
        let root_b = Self::find(parent, b);
        if root_a != root_b {
            let (keep, drop) = if root_a <= root_b { (root_a, root_b) } else { (root_b, root_a) };
            parent.insert(drop, keep);
        }
    }
}

#[async_trait]
impl StageService for RefineClusteringStage {
    fn name(&self) -> &'static str {
        "stage35_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage3_completed && !item.stages().stage35_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        item.stages_mut().stage35_completed = true;
        item.stages_mut().stage35_at = Some(Utc::now());
        StageOutcome::Advanced(item)
    }

    async fn run_batch(&self, batch: StageBatch) -> Result<Vec<NormalizedItem>, CatalogError> {
        let (mut eligible, mut rest): (Vec<_>, Vec<_>) = batch.into_iter().partition(|item| self.is_eligible(item));

        let mut representative: HashMap<String, (String, Vec<(String, String)>)> = HashMap::new();
        for item in &eligible {
            representative
                .entry(item.normalized_reference().to_string())
                .or_insert_with(|| (item.normalized_name().to_string(), Self::attributes(item)));
        }

        let mut parent: HashMap<String, String> = representative.keys().map(|k| (k.clone(), k.clone())).collect();
        let keys: Vec<String> = representative.keys().cloned().collect();
        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                let (name_a, attrs_a) = &representative[&keys[i]];
                let (name_b, attrs_b) = &representative[&keys[j]];
                let candidate_a = SimilarityCandidate {
                    normalized_name: name_a.clone(),
                    attributes: attrs_a.clone(),
                };
                let candidate_b = SimilarityCandidate {
                    normalized_name: name_b.clone(),
                    attributes: attrs_b.clone(),
                };
                let score = self.similarity.similarity(&candidate_a, &candidate_b).await;
                if score.meets(self.threshold) {
                    Self::union(&mut parent, &keys[i], &keys[j]);
                }
            }
        }

        let now = Utc::now();
        for item in &mut eligible {
            let canonical = Self::find(&mut parent, item.normalized_reference());
            item.set_normalized_reference(canonical);
            item.stages_mut().stage35_completed = true;
            item.stages_mut().stage35_at = Some(now);
        }

        rest.extend(eligible);
        Ok(rest)
    }
}
