//! # Hierarchical Classifier
//!
//! Top-down taxonomy walk driven by the AI orchestrator (spec.md §4.4):
//! at each level, asks the orchestrator to choose among the current
//! node's children (at most `max_children_per_level`) given the item's
//! normalized name and the path so far. Stops at a leaf or when the
//! returned confidence falls below `kpved_stop_threshold`, in which case
//! the last sufficiently-confident node is kept. Stateless between calls.
//!
//! Before any AI call, consults the injected `BenchmarkFinder`: a match
//! with similarity ≥ `benchmark_short_circuit_threshold` (default 0.92)
//! short-circuits the walk with zero orchestrator calls.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

use catalog_domain::cancellation::CancellationToken;
use catalog_domain::entities::ClassifierNode;
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::ClassifierRepository;
use catalog_domain::services::{BenchmarkFinder, ClassifyRequest};

use crate::application::orchestrator::Orchestrator;

#[derive(Debug, Clone)]
pub struct ClassifyStep {
    pub level: u32,
    pub chosen_code: String,
    pub confidence: f32,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ClassifyOutcome {
    pub final_code: Option<String>,
    pub final_name: Option<String>,
    pub final_confidence: f32,
    pub steps: Vec<ClassifyStep>,
    pub benchmark_short_circuit: bool,
}

/// The orchestrator is expected to respond with this shape rendered as
/// JSON text in `ClassifyResponse::answer`; a response that doesn't
/// parse is treated as "no confident choice" at that level.
#[derive(Debug, Deserialize)]
struct ChildChoice {
    code: String,
    confidence: f32,
}

pub struct HierarchicalClassifier {
    classifier: Arc<dyn ClassifierRepository>,
    benchmark_finder: Arc<dyn BenchmarkFinder>,
    orchestrator: Arc<Orchestrator>,
    max_children_per_level: usize,
    stop_threshold: f32,
    benchmark_short_circuit_threshold: f32,
}

impl HierarchicalClassifier {
    pub fn new(
        classifier: Arc<dyn ClassifierRepository>,
        benchmark_finder: Arc<dyn BenchmarkFinder>,
        orchestrator: Arc<Orchestrator>,
        max_children_per_level: usize,
        stop_threshold: f32,
        benchmark_short_circuit_threshold: f32,
    ) -> Self {
        Self {
            classifier,
            benchmark_finder,
            orchestrator,
            max_children_per_level,
            stop_threshold,
            benchmark_short_circuit_threshold,
        }
    }

    fn render_prompt(name: &str, path: &[ClassifyStep], children: &[ClassifierNode]) -> String {
        let options: Vec<String> = children.iter().map(|c| format!("{}: {}", c.code(), c.name())).collect();
        let trail: Vec<String> = path.iter().map(|s| s.chosen_code.clone()).collect();
        format!(
            "Classify \"{name}\" into one of the following taxonomy nodes. \
             Path so far: [{}]. Options:\n{}\n\
             Respond with JSON: {{\"code\": \"<chosen code>\", \"confidence\": <0..1>}}.",
            trail.join(" > "),
            options.join("\n"),
        )
    }

    async fn choose_child(
        &self,
        name: &str,
        path: &[ClassifyStep],
        children: &[ClassifierNode],
        cancel: &CancellationToken,
    ) -> Result<Option<ChildChoice>, CatalogError> {
        let prompt = Self::render_prompt(name, path, children);
        let response = self
            .orchestrator
            .classify(ClassifyRequest { prompt, hint: path.last().map(|s| s.chosen_code.clone()) }, cancel.clone())
            .await?;

        match serde_json::from_str::<ChildChoice>(&response.answer) {
            Ok(choice) if children.iter().any(|c| c.code() == choice.code) => Ok(Some(choice)),
            _ => Ok(None),
        }
    }

    /// Walks the taxonomy for `normalized_name`, returning the deepest
    /// node the orchestrator stayed confident about.
    pub async fn classify(
        &self,
        normalized_name: &str,
        cancel: CancellationToken,
    ) -> Result<ClassifyOutcome, CatalogError> {
        if let Some(benchmark) = self.benchmark_finder.find_closest(normalized_name).await {
            if benchmark.similarity.value() >= self.benchmark_short_circuit_threshold {
                return Ok(ClassifyOutcome {
                    final_code: Some(benchmark.code),
                    final_name: Some(benchmark.name),
                    final_confidence: 0.95,
                    steps: Vec::new(),
                    benchmark_short_circuit: true,
                });
            }
        }

        let mut steps: Vec<ClassifyStep> = Vec::new();
        let mut best_node: Option<ClassifierNode> = None;
        let mut parent_code: Option<String> = None;
        let mut level: u32 = 0;

        loop {
            let mut children = self.classifier.children(parent_code.as_deref()).await?;
            if children.is_empty() {
                break;
            }
            children.truncate(self.max_children_per_level);

            let started = Instant::now();
            let choice = self.choose_child(normalized_name, &steps, &children, &cancel).await?;
            let duration_ms = started.elapsed().as_millis() as u64;

            match choice {
                Some(choice) if choice.confidence >= self.stop_threshold => {
                    let node = children.into_iter().find(|c| c.code() == choice.code).expect("validated above");
                    level += 1;
                    steps.push(ClassifyStep {
                        level,
                        chosen_code: node.code().to_string(),
                        confidence: choice.confidence,
                        duration_ms,
                    });
                    parent_code = Some(node.code().to_string());
                    best_node = Some(node);
                }
                _ => break,
            }
        }

        Ok(ClassifyOutcome {
            final_code: best_node.as_ref().map(|n| n.code().to_string()),
            final_name: best_node.as_ref().map(|n| n.name().to_string()),
            final_confidence: steps.last().map(|s| s.confidence).unwrap_or(0.0),
            steps,
            benchmark_short_circuit: false,
        })
    }
}
