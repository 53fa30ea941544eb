use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::client::{
    BulkItemOutcome, BulkOperation, BulkOptions, DocumentStore, Page, UpdateByQuery,
    UpdateByQueryReport,
};
use crate::engine::errors::{DumpError, RequestError};
use crate::engine::types::{DocumentRef, Fields, RawDocument, ScanFilter};

const LOG_TARGET: &str = "docshift::store";

/// What a server-side script did to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEffect {
    Updated,
    Noop,
}

/// Native stand-in for a stored script: mutates `fields` given `params`.
pub type ScriptFn = Arc<dyn Fn(&mut Fields, &Fields) -> Result<ScriptEffect, String> + Send + Sync>;

#[derive(Debug, Clone)]
struct StoredDocument {
    entity_type: String,
    fields: Fields,
    version: u64,
}

/// In-memory document store, ordered by (container, id).
///
/// Writes are visible immediately, so `refresh` only counts requests.
/// Update-by-query is all-or-nothing under a single write lock, which also
/// means it never observes version conflicts.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocumentRef, StoredDocument>>,
    scripts: RwLock<HashMap<String, ScriptFn>>,
    page_requests: AtomicU64,
    bulk_requests: AtomicU64,
    refreshes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: impl IntoIterator<Item = RawDocument>) -> Self {
        let store = Self::new();
        for doc in documents {
            store.insert(doc);
        }
        store
    }

    /// Loads a JSON array of documents.
    pub fn load_from_file(path: &Path) -> Result<Self, DumpError> {
        let raw = fs::read_to_string(path)?;
        let documents: Vec<RawDocument> = serde_json::from_str(&raw)?;
        info!(
            target: LOG_TARGET,
            path = %path.display(),
            documents = documents.len(),
            "Loaded document dump"
        );
        Ok(Self::with_documents(documents))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), DumpError> {
        let documents = self.documents();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&documents)?)?;
        fs::rename(&tmp, path)?;
        info!(
            target: LOG_TARGET,
            path = %path.display(),
            documents = documents.len(),
            "Saved document dump"
        );
        Ok(())
    }

    /// Registers the native handler executed for script `source`.
    pub fn register_script(&self, source: impl Into<String>, script: ScriptFn) {
        self.scripts.write().insert(source.into(), script);
    }

    pub fn insert(&self, doc: RawDocument) {
        let stored = StoredDocument {
            entity_type: doc.entity_type,
            fields: doc.fields,
            version: 1,
        };
        self.documents.write().insert(doc.reference, stored);
    }

    pub fn get(&self, reference: &DocumentRef) -> Option<RawDocument> {
        self.documents
            .read()
            .get(reference)
            .map(|stored| to_raw(reference, stored))
    }

    pub fn version(&self, reference: &DocumentRef) -> Option<u64> {
        self.documents.read().get(reference).map(|s| s.version)
    }

    /// All documents in scan order.
    pub fn documents(&self) -> Vec<RawDocument> {
        self.documents
            .read()
            .iter()
            .map(|(reference, stored)| to_raw(reference, stored))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    pub fn page_requests(&self) -> u64 {
        self.page_requests.load(Ordering::Relaxed)
    }

    pub fn bulk_requests(&self) -> u64 {
        self.bulk_requests.load(Ordering::Relaxed)
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    fn validate_filter(filter: &ScanFilter) -> Result<(), RequestError> {
        match filter.blank_entry() {
            Some(field) => Err(RequestError::Rejected(format!(
                "malformed filter: blank entry in {field}"
            ))),
            None => Ok(()),
        }
    }
}

impl StoredDocument {
    fn matches(&self, filter: &ScanFilter, reference: &DocumentRef) -> bool {
        filter.matches_parts(reference, &self.entity_type, &self.fields)
    }
}

fn to_raw(reference: &DocumentRef, stored: &StoredDocument) -> RawDocument {
    RawDocument {
        reference: reference.clone(),
        entity_type: stored.entity_type.clone(),
        fields: stored.fields.clone(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_page(
        &self,
        filter: &ScanFilter,
        after: Option<&DocumentRef>,
        page_size: usize,
    ) -> Result<Page, RequestError> {
        Self::validate_filter(filter)?;
        if page_size == 0 {
            return Err(RequestError::Rejected("page size must be positive".into()));
        }
        self.page_requests.fetch_add(1, Ordering::Relaxed);

        let lower = match after {
            Some(cursor) => Bound::Excluded(cursor.clone()),
            None => Bound::Unbounded,
        };
        let documents: Vec<RawDocument> = self
            .documents
            .read()
            .range((lower, Bound::Unbounded))
            .filter(|(reference, stored)| stored.matches(filter, reference))
            .take(page_size)
            .map(|(reference, stored)| to_raw(reference, stored))
            .collect();

        let next = if documents.len() == page_size {
            documents.last().map(|doc| doc.reference.clone())
        } else {
            None
        };
        Ok(Page { documents, next })
    }

    async fn bulk_write(
        &self,
        operations: &[BulkOperation],
        options: &BulkOptions,
    ) -> Result<Vec<BulkItemOutcome>, RequestError> {
        if operations.is_empty() {
            return Err(RequestError::Rejected("empty bulk request".into()));
        }
        self.bulk_requests.fetch_add(1, Ordering::Relaxed);

        let mut documents = self.documents.write();
        let outcomes = operations
            .iter()
            .map(|op| match documents.get_mut(&op.reference) {
                Some(stored) => {
                    for (key, value) in &op.patch {
                        stored.fields.insert(key.clone(), value.clone());
                    }
                    stored.version += 1;
                    BulkItemOutcome::ok(op.reference.clone())
                }
                None => BulkItemOutcome::failed(
                    op.reference.clone(),
                    format!("document_missing: {}", op.reference),
                ),
            })
            .collect();
        drop(documents);

        if options.refresh {
            self.refreshes.fetch_add(1, Ordering::Relaxed);
        }
        debug!(target: LOG_TARGET, operations = operations.len(), "Bulk request applied");
        Ok(outcomes)
    }

    async fn update_by_query(
        &self,
        request: &UpdateByQuery,
    ) -> Result<UpdateByQueryReport, RequestError> {
        Self::validate_filter(&request.filter)?;
        let script = self
            .scripts
            .read()
            .get(&request.script.source)
            .cloned()
            .ok_or_else(|| {
                RequestError::Rejected(format!("unknown script: {}", request.script.source))
            })?;

        let mut documents = self.documents.write();
        let mut rewritten = Vec::new();
        let mut report = UpdateByQueryReport::default();

        for (reference, stored) in documents.iter() {
            if !stored.matches(&request.filter, reference) {
                continue;
            }
            report.total += 1;
            let mut fields = stored.fields.clone();
            match script(&mut fields, &request.script.params) {
                Ok(ScriptEffect::Updated) => rewritten.push((reference.clone(), fields)),
                Ok(ScriptEffect::Noop) => report.noops += 1,
                Err(reason) => {
                    return Err(RequestError::Rejected(format!(
                        "script failed on {reference}: {reason}"
                    )));
                }
            }
        }

        report.updated = rewritten.len() as u64;
        for (reference, fields) in rewritten {
            if let Some(stored) = documents.get_mut(&reference) {
                stored.fields = fields;
                stored.version += 1;
            }
        }
        drop(documents);

        if request.refresh {
            self.refreshes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(report)
    }
}
