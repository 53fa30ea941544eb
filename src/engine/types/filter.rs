use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::document::{DocumentRef, Fields, RawDocument};

/// Selects documents for a scan or an update-by-query.
///
/// An empty set means "any" for that dimension. `required_fields` keeps only
/// documents in which every listed field exists with a non-null value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFilter {
    #[serde(default)]
    pub entity_types: BTreeSet<String>,
    #[serde(default)]
    pub containers: BTreeSet<String>,
    #[serde(default)]
    pub required_fields: BTreeSet<String>,
}

impl ScanFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_types.insert(entity_type.into());
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.containers.insert(container.into());
        self
    }

    pub fn with_required_field(mut self, field: impl Into<String>) -> Self {
        self.required_fields.insert(field.into());
        self
    }

    pub fn matches_container(&self, container: &str) -> bool {
        self.containers.is_empty() || self.containers.contains(container)
    }

    pub fn matches(&self, doc: &RawDocument) -> bool {
        self.matches_parts(&doc.reference, &doc.entity_type, &doc.fields)
    }

    /// Same as [`ScanFilter::matches`] for a document not held as a
    /// `RawDocument`.
    pub fn matches_parts(&self, reference: &DocumentRef, entity_type: &str, fields: &Fields) -> bool {
        self.matches_container(&reference.container_id)
            && (self.entity_types.is_empty() || self.entity_types.contains(entity_type))
            && self
                .required_fields
                .iter()
                .all(|field| fields.get(field).is_some_and(|v| !v.is_null()))
    }

    /// Returns the first blank entry, if any. Stores reject such filters.
    pub fn blank_entry(&self) -> Option<&'static str> {
        let blank = |set: &BTreeSet<String>| set.iter().any(|s| s.trim().is_empty());
        if blank(&self.entity_types) {
            Some("entity_types")
        } else if blank(&self.containers) {
            Some("containers")
        } else if blank(&self.required_fields) {
            Some("required_fields")
        } else {
            None
        }
    }
}
