//! # Algorithmic Classify Stage
//!
//! Deterministic taxonomy lookup from extracted keywords (spec.md §4.1
//! step 8): walks `ClassifierNode` top-down, at each level picking the
//! child whose name shares the most tokens with the item's normalized
//! name, until no child improves on the current node or a leaf is
//! reached. Confidence is the token-overlap ratio of the final match.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

use catalog_domain::entities::ClassifierNode;
use catalog_domain::entities::NormalizedItem;
use catalog_domain::repositories::ClassifierRepository;
use catalog_domain::services::{StageOutcome, StageService};
use catalog_domain::value_objects::{Confidence, ProcessingLevel};

pub struct AlgorithmicClassifyStage {
    classifier: Arc<dyn ClassifierRepository>,
    enhanced_threshold: f32,
}

impl AlgorithmicClassifyStage {
    pub fn new(classifier: Arc<dyn ClassifierRepository>, enhanced_threshold: f32) -> Self {
        Self { classifier, enhanced_threshold }
    }

    fn tokens(name: &str) -> HashSet<String> {
        name.split_whitespace().map(|t| t.to_lowercase()).collect()
    }

    fn overlap(a: &HashSet<String>, node_name: &str) -> f32 {
        let b = Self::tokens(node_name);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let shared = a.intersection(&b).count();
        shared as f32 / a.len().max(b.len()) as f32
    }

    async fn best_child(
        &self,
        parent_code: Option<&str>,
        tokens: &HashSet<String>,
    ) -> Result<Option<(ClassifierNode, f32)>, catalog_domain::CatalogError> {
        let children = self.classifier.children(parent_code).await?;
        Ok(children
            .into_iter()
            .map(|node| {
                let score = Self::overlap(tokens, node.name());
                (node, score)
            })
            .filter(|(_, score)| *score > 0.0)
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)))
    }
}

#[async_trait]
impl StageService for AlgorithmicClassifyStage {
    fn name(&self) -> &'static str {
        "stage6_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage5_completed && !item.stages().stage6_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        let tokens = Self::tokens(item.normalized_name());
        let mut current_parent: Option<String> = None;
        let mut best: Option<(ClassifierNode, f32)> = None;

        loop {
            match self.best_child(current_parent.as_deref(), &tokens).await {
                Ok(Some((node, score))) => {
                    current_parent = Some(node.code().to_string());
                    best = Some((node, score));
                }
                Ok(None) => break,
                Err(err) => {
                    item.record_error(err.to_string());
                    return StageOutcome::Errored { item, message: err.to_string() };
                }
            }
        }

        let now = Utc::now();
        if let Some((node, score)) = best {
            let level = if score >= self.enhanced_threshold {
                ProcessingLevel::Enhanced
            } else {
                ProcessingLevel::Basic
            };
            if let Err(err) = item.classify(node.code().to_string(), node.name().to_string(), Confidence::new(score), level, None) {
                item.record_error(err.to_string());
                item.stages_mut().stage6_completed = true;
                item.stages_mut().stage6_at = Some(now);
                return StageOutcome::Errored { item, message: err.to_string() };
            }
        }

        item.stages_mut().stage6_completed = true;
        item.stages_mut().stage6_at = Some(now);
        StageOutcome::Advanced(item)
    }
}
