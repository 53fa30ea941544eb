use crate::engine::store::MemoryStore;
use crate::engine::types::RawDocument;
use crate::migrations;
use std::sync::Arc;

pub struct StoreFactory {
    documents: Vec<RawDocument>,
    scripts: bool,
}

impl StoreFactory {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            scripts: false,
        }
    }

    pub fn with_documents(mut self, documents: impl IntoIterator<Item = RawDocument>) -> Self {
        self.documents.extend(documents);
        self
    }

    /// Registers the built-in migration scripts.
    pub fn with_scripts(mut self) -> Self {
        self.scripts = true;
        self
    }

    pub fn create(self) -> Arc<MemoryStore> {
        let store = MemoryStore::with_documents(self.documents);
        if self.scripts {
            migrations::register_scripts(&store);
        }
        Arc::new(store)
    }
}
