//! # Counterparty Enrichment Service
//!
//! Fans a lookup across registered registry providers and merges the
//! results into a `NormalizedCounterparty` (spec.md §4.5). Never
//! overwrites a non-empty manually-edited field — that invariant lives on
//! the entity itself (`enrich_field`); this service's job is choosing,
//! per field, the highest-confidence source among the registries that
//! answered.

use std::sync::Arc;

use catalog_domain::entities::NormalizedCounterparty;
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::CounterpartyRepository;
use catalog_domain::services::{RegistryProviderAdapter, RegistryRecord};

pub struct EnrichResult {
    pub counterparty_id: catalog_domain::value_objects::CounterpartyId,
    pub outcome: Result<(), CatalogError>,
}

pub struct EnrichmentService {
    counterparties: Arc<dyn CounterpartyRepository>,
    providers: Vec<Arc<dyn RegistryProviderAdapter>>,
}

impl EnrichmentService {
    pub fn new(counterparties: Arc<dyn CounterpartyRepository>, providers: Vec<Arc<dyn RegistryProviderAdapter>>) -> Self {
        Self { counterparties, providers }
    }

    /// Queries every registered registry in parallel and returns the
    /// union of results tagged by source, highest confidence first per
    /// field is resolved by `apply_best`.
    async fn gather(&self, tax_id: &str) -> Vec<(String, RegistryRecord)> {
        let futures = self.providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let tax_id = tax_id.to_string();
            async move {
                match provider.lookup(&tax_id).await {
                    Ok(Some(record)) => Some((provider.provider_name().to_string(), record)),
                    Ok(None) => None,
                    Err(_) => None,
                }
            }
        });
        futures::future::join_all(futures).await.into_iter().flatten().collect()
    }

    fn apply_best(counterparty: &mut NormalizedCounterparty, results: &[(String, RegistryRecord)]) {
        const FIELDS: [&str; 10] = [
            "secondary_tax_id",
            "legal_form",
            "legal_address",
            "postal_address",
            "phone",
            "email",
            "subcategory",
            "account_number",
            "bank_name",
            "bic",
        ];

        for field in FIELDS {
            let best = results
                .iter()
                .filter_map(|(source, record)| Self::field_value(record, field).map(|v| (source, v, record.confidence)))
                .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));
            if let Some((source, value, _)) = best {
                counterparty.enrich_field(field, value, source);
            }
        }
    }

    fn field_value(record: &RegistryRecord, field: &str) -> Option<String> {
        match field {
            "secondary_tax_id" => record.secondary_tax_id.clone(),
            "legal_form" => record.legal_form.clone(),
            "legal_address" => record.legal_address.clone(),
            "postal_address" => record.postal_address.clone(),
            "phone" => record.phone.clone(),
            "email" => record.email.clone(),
            "subcategory" => record.subcategory.clone(),
            "account_number" => record.account_number.clone(),
            "bank_name" => record.bank_name.clone(),
            "bic" => record.bic.clone(),
            _ => None,
        }
    }

    /// Enriches one counterparty in place and persists it.
    pub async fn enrich(&self, mut counterparty: NormalizedCounterparty) -> Result<NormalizedCounterparty, CatalogError> {
        let results = self.gather(counterparty.tax_id()).await;
        Self::apply_best(&mut counterparty, &results);
        self.counterparties.save(&counterparty).await?;
        Ok(counterparty)
    }

    /// Enriches a batch of ids without aborting on a single failure;
    /// each id gets its own success/failure outcome.
    pub async fn enrich_bulk(&self, ids: Vec<catalog_domain::value_objects::CounterpartyId>) -> Vec<EnrichResult> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = match self.counterparties.find_by_id(id).await {
                Ok(Some(counterparty)) => self.enrich(counterparty).await.map(|_| ()),
                Ok(None) => Err(CatalogError::not_found(format!("counterparty {id}"))),
                Err(err) => Err(err),
            };
            out.push(EnrichResult { counterparty_id: id, outcome });
        }
        out
    }

    /// Groups counterparties sharing an equal `tax_id` or
    /// `secondary_tax_id`. Each inner `Vec` is a duplicate group of size
    /// ≥ 2.
    pub async fn find_duplicates(&self) -> Result<Vec<Vec<NormalizedCounterparty>>, CatalogError> {
        let all = self.counterparties.list_paginated(0, usize::MAX / 2).await?;
        let mut groups: Vec<Vec<NormalizedCounterparty>> = Vec::new();
        let mut seen: std::collections::HashSet<catalog_domain::value_objects::CounterpartyId> = std::collections::HashSet::new();

        for candidate in &all {
            if seen.contains(&candidate.id()) {
                continue;
            }
            let mut group: Vec<NormalizedCounterparty> = all
                .iter()
                .filter(|other| {
                    other.tax_id() == candidate.tax_id()
                        || (candidate.secondary_tax_id().is_some() && other.secondary_tax_id() == candidate.secondary_tax_id())
                })
                .cloned()
                .collect();
            if group.len() > 1 {
                group.sort_by_key(|c| c.id());
                for member in &group {
                    seen.insert(member.id());
                }
                groups.push(group);
            } else {
                seen.insert(candidate.id());
            }
        }
        Ok(groups)
    }

    /// Collapses `duplicates` onto `master_id`: every non-empty field of
    /// each duplicate fills an empty field of the master, then the
    /// duplicate rows are deleted atomically.
    pub async fn merge_duplicates(
        &self,
        master_id: catalog_domain::value_objects::CounterpartyId,
        duplicate_ids: &[catalog_domain::value_objects::CounterpartyId],
    ) -> Result<NormalizedCounterparty, CatalogError> {
        let mut master = self
            .counterparties
            .find_by_id(master_id)
            .await?
            .ok_or_else(|| CatalogError::not_found(format!("counterparty {master_id}")))?;

        for dup_id in duplicate_ids {
            if *dup_id == master_id {
                continue;
            }
            if let Some(dup) = self.counterparties.find_by_id(*dup_id).await? {
                master.merge_from(&dup);
            }
        }

        self.counterparties.save(&master).await?;
        for dup_id in duplicate_ids {
            if *dup_id != master_id {
                self.counterparties.delete(*dup_id).await?;
            }
        }
        Ok(master)
    }
}
