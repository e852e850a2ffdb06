//! # Article Extract Stage
//!
//! Deterministic regex-based extraction of an article/SKU code embedded
//! in the item name (spec.md §4.1 step 7), e.g. `ГОСТ 7798-70` or
//! `DIN-933`. Purely a best-effort hint for algorithmic classify; absence
//! of a match is not an error.

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::services::{StageOutcome, StageService};

static ARTICLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([a-zа-я]{2,6}[\s-]?\d{2,5}(?:[-./]\d{1,4})?)\b").unwrap());

pub struct ArticleExtractStage;

#[async_trait]
impl StageService for ArticleExtractStage {
    fn name(&self) -> &'static str {
        "stage4_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage35_completed && !item.stages().stage4_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        let article = ARTICLE_PATTERN
            .find(item.normalized_name())
            .map(|m| m.as_str().to_string());
        item.stages_mut().article_code = article;
        item.stages_mut().stage4_completed = true;
        item.stages_mut().stage4_at = Some(Utc::now());
        StageOutcome::Advanced(item)
    }
}
