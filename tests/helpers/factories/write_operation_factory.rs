use crate::engine::types::{DocumentRef, Fields, WriteOperation};
use serde_json::{Value, json};
use std::collections::HashMap;

pub struct WriteOperationFactory {
    params: HashMap<String, Value>,
    patch: Fields,
}

impl WriteOperationFactory {
    pub fn new() -> Self {
        let mut params = HashMap::new();
        params.insert("container_id".into(), json!("stix_domain_objects"));
        params.insert("document_id".into(), json!("doc-1"));

        let mut patch = Fields::new();
        patch.insert("migrated".into(), json!(true));
        Self { params, patch }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn with_patch(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.patch.insert(name.to_string(), value.into());
        self
    }

    fn container(&self) -> String {
        self.params["container_id"].as_str().unwrap().to_string()
    }

    pub fn create(self) -> WriteOperation {
        let id = self.params["document_id"].as_str().unwrap().to_string();
        WriteOperation::new(DocumentRef::new(self.container(), id), self.patch)
    }

    /// Targets `doc-00000`, `doc-00001`, ... matching `DocumentFactory::create_list`.
    pub fn create_list(self, count: usize) -> Vec<WriteOperation> {
        let container = self.container();
        (0..count)
            .map(|i| {
                let mut patch = self.patch.clone();
                patch.insert("seq".into(), json!(i));
                WriteOperation::new(DocumentRef::new(container.clone(), format!("doc-{i:05}")), patch)
            })
            .collect()
    }
}
