//! # Pipeline Stages
//!
//! The twelve (thirteen counting the half-step insertions) ordered
//! stages of the normalization and classification pipeline (spec.md
//! §4.1). Each implements `StageService`; `ordered_stages` returns them
//! in the exact sequence the pipeline engine must run them, since a
//! stage never observes an item until its precondition flag is set.

mod ai_classify;
mod algorithmic_classify;
mod article_extract;
mod attribute_extract;
mod dimension_extract;
mod fallback;
mod final_decision;
mod group;
mod lowercase;
mod preprocess;
mod refine_clustering;
mod type_detect;
mod validate_code;

pub use ai_classify::AiClassifyStage;
pub use algorithmic_classify::AlgorithmicClassifyStage;
pub use article_extract::ArticleExtractStage;
pub use attribute_extract::AttributeExtractStage;
pub use dimension_extract::DimensionExtractStage;
pub use fallback::FallbackStage;
pub use final_decision::FinalDecisionStage;
pub use group::GroupStage;
pub use lowercase::LowercaseStage;
pub use preprocess::PreprocessStage;
pub use refine_clustering::RefineClusteringStage;
pub use type_detect::TypeDetectStage;
pub use validate_code::ValidateCodeStage;

use std::sync::Arc;

use catalog_domain::services::StageService;

/// Builds the ordered stage list the pipeline engine iterates each run.
/// Every stage's `name()` is the exact `StageFlags` field the engine
/// uses to find that stage's pending items.
#[allow(clippy::too_many_arguments)]
pub fn ordered_stages(
    preprocess: PreprocessStage,
    lowercase: LowercaseStage,
    type_detect: TypeDetectStage,
    attribute_extract: AttributeExtractStage,
    group: GroupStage,
    refine_clustering: RefineClusteringStage,
    article_extract: ArticleExtractStage,
    dimension_extract: DimensionExtractStage,
    algorithmic_classify: AlgorithmicClassifyStage,
    validate_code: ValidateCodeStage,
    ai_classify: AiClassifyStage,
    fallback: FallbackStage,
    final_decision: FinalDecisionStage,
) -> Vec<Arc<dyn StageService>> {
    vec![
        Arc::new(preprocess),
        Arc::new(lowercase),
        Arc::new(type_detect),
        Arc::new(attribute_extract),
        Arc::new(group),
        Arc::new(refine_clustering),
        Arc::new(article_extract),
        Arc::new(dimension_extract),
        Arc::new(algorithmic_classify),
        Arc::new(validate_code),
        Arc::new(ai_classify),
        Arc::new(fallback),
        Arc::new(final_decision),
    ]
}
