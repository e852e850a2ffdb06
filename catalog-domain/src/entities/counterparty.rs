//! # NormalizedCounterparty Entity

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::value_objects::{Confidence, CounterpartyId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactDetails {
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedCounterparty {
    id: CounterpartyId,
    tax_id: String,
    secondary_tax_id: Option<String>,
    legal_form: Option<String>,
    legal_address: Option<String>,
    postal_address: Option<String>,
    contacts: ContactDetails,
    bank_details: BankDetails,
    subcategory: Option<String>,
    enrichment_source: Option<String>,
    quality_score: Confidence,
    /// Field names that were set through the manual-update API rather
    /// than enrichment — enrichment must never overwrite these. See
    /// `DESIGN.md` Open Question 5.
    edited_manually: HashSet<String>,
}

impl NormalizedCounterparty {
    pub fn new(tax_id: impl Into<String>) -> Self {
        Self {
            id: CounterpartyId::new(),
            tax_id: tax_id.into(),
            secondary_tax_id: None,
            legal_form: None,
            legal_address: None,
            postal_address: None,
            contacts: ContactDetails::default(),
            bank_details: BankDetails::default(),
            subcategory: None,
            enrichment_source: None,
            quality_score: Confidence::ZERO,
            edited_manually: HashSet::new(),
        }
    }

    /// Reconstructs a counterparty from stored state, for repository
    /// adapters reading a row back.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: CounterpartyId,
        tax_id: String,
        secondary_tax_id: Option<String>,
        legal_form: Option<String>,
        legal_address: Option<String>,
        postal_address: Option<String>,
        contacts: ContactDetails,
        bank_details: BankDetails,
        subcategory: Option<String>,
        enrichment_source: Option<String>,
        quality_score: Confidence,
        edited_manually: HashSet<String>,
    ) -> Self {
        Self {
            id,
            tax_id,
            secondary_tax_id,
            legal_form,
            legal_address,
            postal_address,
            contacts,
            bank_details,
            subcategory,
            enrichment_source,
            quality_score,
            edited_manually,
        }
    }

    pub fn id(&self) -> CounterpartyId {
        self.id
    }

    pub fn tax_id(&self) -> &str {
        &self.tax_id
    }

    pub fn secondary_tax_id(&self) -> Option<&str> {
        self.secondary_tax_id.as_deref()
    }

    pub fn legal_form(&self) -> Option<&str> {
        self.legal_form.as_deref()
    }

    pub fn legal_address(&self) -> Option<&str> {
        self.legal_address.as_deref()
    }

    pub fn postal_address(&self) -> Option<&str> {
        self.postal_address.as_deref()
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    pub fn enrichment_source(&self) -> Option<&str> {
        self.enrichment_source.as_deref()
    }

    pub fn edited_manually(&self) -> &HashSet<String> {
        &self.edited_manually
    }

    pub fn contacts(&self) -> &ContactDetails {
        &self.contacts
    }

    pub fn bank_details(&self) -> &BankDetails {
        &self.bank_details
    }

    pub fn quality_score(&self) -> Confidence {
        self.quality_score
    }

    pub fn set_quality_score(&mut self, score: Confidence) {
        self.quality_score = score;
    }

    pub fn is_edited_manually(&self, field: &str) -> bool {
        self.edited_manually.contains(field)
    }

    /// Manual field update via the admin/update API. Marks the field as
    /// manually edited so enrichment never overwrites it again.
    pub fn set_field_manually(&mut self, field: &str, value: String) {
        match field {
            "secondary_tax_id" => self.secondary_tax_id = Some(value),
            "legal_form" => self.legal_form = Some(value),
            "legal_address" => self.legal_address = Some(value),
            "postal_address" => self.postal_address = Some(value),
            "phone" => self.contacts.phone = Some(value),
            "email" => self.contacts.email = Some(value),
            "subcategory" => self.subcategory = Some(value),
            "account_number" => self.bank_details.account_number = Some(value),
            "bank_name" => self.bank_details.bank_name = Some(value),
            "bic" => self.bank_details.bic = Some(value),
            _ => return,
        }
        self.edited_manually.insert(field.to_string());
    }

    /// Fills empty fields from an enrichment source, never overwriting a
    /// non-empty value and never touching a manually-edited field.
    pub fn enrich_field(&mut self, field: &str, value: String, source: &str) {
        if self.is_edited_manually(field) {
            return;
        }
        let slot_is_empty = match field {
            "secondary_tax_id" => self.secondary_tax_id.is_none(),
            "legal_form" => self.legal_form.is_none(),
            "legal_address" => self.legal_address.is_none(),
            "postal_address" => self.postal_address.is_none(),
            "phone" => self.contacts.phone.is_none(),
            "email" => self.contacts.email.is_none(),
            "subcategory" => self.subcategory.is_none(),
            "account_number" => self.bank_details.account_number.is_none(),
            "bank_name" => self.bank_details.bank_name.is_none(),
            "bic" => self.bank_details.bic.is_none(),
            _ => false,
        };
        if !slot_is_empty {
            return;
        }
        match field {
            "secondary_tax_id" => self.secondary_tax_id = Some(value),
            "legal_form" => self.legal_form = Some(value),
            "legal_address" => self.legal_address = Some(value),
            "postal_address" => self.postal_address = Some(value),
            "phone" => self.contacts.phone = Some(value),
            "email" => self.contacts.email = Some(value),
            "subcategory" => self.subcategory = Some(value),
            "account_number" => self.bank_details.account_number = Some(value),
            "bank_name" => self.bank_details.bank_name = Some(value),
            "bic" => self.bank_details.bic = Some(value),
            _ => return,
        }
        self.enrichment_source = Some(source.to_string());
    }

    /// Merges `other` (a duplicate) into `self`: every non-empty field of
    /// `other` fills an empty field of `self`. Caller deletes `other`
    /// atomically afterward.
    pub fn merge_from(&mut self, other: &NormalizedCounterparty) {
        if let Some(v) = &other.secondary_tax_id {
            self.enrich_field("secondary_tax_id", v.clone(), "merge");
        }
        if let Some(v) = &other.legal_form {
            self.enrich_field("legal_form", v.clone(), "merge");
        }
        if let Some(v) = &other.legal_address {
            self.enrich_field("legal_address", v.clone(), "merge");
        }
        if let Some(v) = &other.postal_address {
            self.enrich_field("postal_address", v.clone(), "merge");
        }
        if let Some(v) = &other.contacts.phone {
            self.enrich_field("phone", v.clone(), "merge");
        }
        if let Some(v) = &other.contacts.email {
            self.enrich_field("email", v.clone(), "merge");
        }
        if let Some(v) = &other.subcategory {
            self.enrich_field("subcategory", v.clone(), "merge");
        }
        if let Some(v) = &other.bank_details.account_number {
            self.enrich_field("account_number", v.clone(), "merge");
        }
        if let Some(v) = &other.bank_details.bank_name {
            self.enrich_field("bank_name", v.clone(), "merge");
        }
        if let Some(v) = &other.bank_details.bic {
            self.enrich_field("bic", v.clone(), "merge");
        }
    }
}
