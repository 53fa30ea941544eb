use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level fields of a stored document.
pub type Fields = Map<String, Value>;

/// Identifies a stored document: the container (index/collection) it lives in
/// and its key within that container.
///
/// Ordering is (container, id), which is also the scan order of a store and
/// therefore usable as a pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    pub container_id: String,
    pub document_id: String,
}

impl DocumentRef {
    pub fn new(container_id: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            document_id: document_id.into(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container_id, self.document_id)
    }
}

/// A document as returned by a scan. Read-only to downstream stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(rename = "ref")]
    pub reference: DocumentRef,
    pub entity_type: String,
    pub fields: Fields,
}

impl RawDocument {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns the field as a non-empty string, if it is one.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

/// A partial update: `patch` is merged into the document's top-level fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteOperation {
    #[serde(rename = "ref")]
    pub reference: DocumentRef,
    pub patch: Fields,
}

impl WriteOperation {
    pub fn new(reference: DocumentRef, patch: Fields) -> Self {
        Self { reference, patch }
    }

    /// Builds an update for `doc` from `(field, value)` pairs.
    pub fn update<I, K>(doc: &RawDocument, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let patch = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::new(doc.reference.clone(), patch)
    }
}
