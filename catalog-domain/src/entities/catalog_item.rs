//! # CatalogItem Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::value_objects::{CatalogItemId, UploadId};

/// A raw record in an upload, preserved verbatim as posted by the
/// external system. Immutable after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    id: CatalogItemId,
    upload_id: UploadId,
    external_reference: String,
    external_code: Option<String>,
    raw_name: String,
    /// Opaque structured attribute payload, preserved verbatim.
    attributes: HashMap<String, String>,
    /// Opaque table-parts payload (nested records the export format
    /// attaches to an item), preserved verbatim.
    table_parts: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl CatalogItem {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        upload_id: UploadId,
        external_reference: impl Into<String>,
        external_code: Option<String>,
        raw_name: impl Into<String>,
        attributes: HashMap<String, String>,
        table_parts: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CatalogItemId::new(),
            upload_id,
            external_reference: external_reference.into(),
            external_code,
            raw_name: raw_name.into(),
            attributes,
            table_parts,
            created_at,
        }
    }

    pub fn id(&self) -> CatalogItemId {
        self.id
    }

    pub fn upload_id(&self) -> UploadId {
        self.upload_id
    }

    pub fn external_reference(&self) -> &str {
        &self.external_reference
    }

    pub fn external_code(&self) -> Option<&str> {
        self.external_code.as_deref()
    }

    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub fn table_parts(&self) -> &serde_json::Value {
        &self.table_parts
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
