//! # Generic Typed Identifier
//!
//! A single generic, phantom-typed id wrapper used by every entity id in
//! this crate (`UploadId`, `CatalogItemId`, ...). Each concrete id is a
//! zero-cost `CatalogId<Marker>` where `Marker` is an uninhabited type that
//! only exists to keep, say, an `UploadId` from being accepted where a
//! `CatalogItemId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CatalogError;

/// Per-entity category marker, implemented by the zero-sized marker types
/// below (`UploadMarker`, `CatalogItemMarker`, ...).
pub trait IdCategory {
    fn category_name() -> &'static str;
}

/// A type-safe identifier backed by a UUID, generic over an entity marker.
pub struct CatalogId<T: IdCategory>(Uuid, PhantomData<T>);

impl<T: IdCategory> CatalogId<T> {
    /// Generates a fresh random (v4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4(), PhantomData)
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    pub fn nil() -> Self {
        Self(Uuid::nil(), PhantomData)
    }

    pub fn from_string(s: &str) -> Result<Self, CatalogError> {
        Uuid::parse_str(s)
            .map(Self::from_uuid)
            .map_err(|e| CatalogError::validation(format!("invalid {} id: {e}", T::category_name())))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn category(&self) -> &'static str {
        T::category_name()
    }
}

impl<T: IdCategory> Default for CatalogId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: IdCategory> Clone for CatalogId<T> {
    fn clone(&self) -> Self {
        Self(self.0, PhantomData)
    }
}

impl<T: IdCategory> Copy for CatalogId<T> {}

impl<T: IdCategory> PartialEq for CatalogId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: IdCategory> Eq for CatalogId<T> {}

impl<T: IdCategory> PartialOrd for CatalogId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: IdCategory> Ord for CatalogId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T: IdCategory> Hash for CatalogId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T: IdCategory> std::fmt::Debug for CatalogId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", T::category_name(), self.0)
    }
}

impl<T: IdCategory> Display for CatalogId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: IdCategory> FromStr for CatalogId<T> {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl<T: IdCategory> From<Uuid> for CatalogId<T> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl<T: IdCategory> From<CatalogId<T>> for Uuid {
    fn from(id: CatalogId<T>) -> Self {
        id.0
    }
}

impl<T: IdCategory> Serialize for CatalogId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de, T: IdCategory> Deserialize<'de> for CatalogId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let uuid = Uuid::deserialize(deserializer)?;
        Ok(Self::from_uuid(uuid))
    }
}

macro_rules! id_marker {
    ($marker:ident, $alias:ident, $category:literal) => {
        #[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $marker;

        impl IdCategory for $marker {
            fn category_name() -> &'static str {
                $category
            }
        }

        pub type $alias = CatalogId<$marker>;
    };
}

id_marker!(UploadMarker, UploadId, "upload");
id_marker!(CatalogItemMarker, CatalogItemId, "catalog_item");
id_marker!(NormalizedItemMarker, NormalizedItemId, "normalized_item");
id_marker!(ClassifierNodeMarker, ClassifierNodeId, "classifier_node");
id_marker!(CounterpartyMarker, CounterpartyId, "counterparty");
id_marker!(SnapshotMarker, SnapshotId, "snapshot");
id_marker!(ProviderMarker, ProviderId, "provider");
id_marker!(AssessmentMarker, AssessmentId, "assessment");
id_marker!(DuplicateGroupMarker, DuplicateGroupId, "duplicate_group");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_of_different_categories_round_trip_independently() {
        let upload = UploadId::new();
        let text = upload.to_string();
        let parsed = UploadId::from_string(&text).unwrap();
        assert_eq!(upload, parsed);
    }

    #[test]
    fn nil_id_is_nil() {
        assert!(UploadId::nil().is_nil());
        assert!(!UploadId::new().is_nil());
    }

    #[test]
    fn invalid_string_is_rejected() {
        assert!(UploadId::from_string("not-a-uuid").is_err());
    }
}
