//! # Entities
//!
//! Objects with identity and a lifecycle, as opposed to the value objects
//! in `crate::value_objects`.

mod catalog_item;
mod classifier_node;
mod counterparty;
mod normalized_item;
mod provider;
mod quality;
mod snapshot;
mod upload;

pub use catalog_item::CatalogItem;
pub use classifier_node::ClassifierNode;
pub use counterparty::{BankDetails, ContactDetails, NormalizedCounterparty};
pub use normalized_item::{NormalizedItem, StageFlags};
pub use provider::{CircuitState, Provider};
pub use quality::{Assessment, DuplicateGroup, Severity, Suggestion, Violation, ViolationKind};
pub use snapshot::{Snapshot, SnapshotMembership, SnapshotType};
pub use upload::{Upload, UploadStatus};
