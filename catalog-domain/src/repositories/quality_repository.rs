//! # Quality Repository Interface

use async_trait::async_trait;

use crate::entities::{Assessment, DuplicateGroup, Suggestion, Violation};
use crate::error::CatalogError;
use crate::value_objects::{AssessmentId, DuplicateGroupId};
use uuid::Uuid;

#[async_trait]
pub trait QualityRepository: Send + Sync {
    async fn save_assessment(&self, assessment: &Assessment) -> Result<(), CatalogError>;
    async fn find_assessment(&self, id: AssessmentId) -> Result<Option<Assessment>, CatalogError>;

    async fn save_duplicate_group(&self, group: &DuplicateGroup) -> Result<(), CatalogError>;
    async fn find_duplicate_group(&self, id: DuplicateGroupId) -> Result<Option<DuplicateGroup>, CatalogError>;
    async fn list_duplicate_groups(&self) -> Result<Vec<DuplicateGroup>, CatalogError>;

    async fn save_violation(&self, violation: &Violation) -> Result<(), CatalogError>;
    async fn find_violation(&self, id: Uuid) -> Result<Option<Violation>, CatalogError>;
    async fn update_violation(&self, violation: &Violation) -> Result<(), CatalogError>;
    async fn list_unresolved_violations(&self) -> Result<Vec<Violation>, CatalogError>;

    async fn save_suggestion(&self, suggestion: &Suggestion) -> Result<(), CatalogError>;
    async fn find_suggestion(&self, id: Uuid) -> Result<Option<Suggestion>, CatalogError>;
    async fn update_suggestion(&self, suggestion: &Suggestion) -> Result<(), CatalogError>;
    async fn list_unapplied_suggestions(&self) -> Result<Vec<Suggestion>, CatalogError>;
}
