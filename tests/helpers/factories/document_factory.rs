use crate::engine::types::{DocumentRef, Fields, RawDocument};
use serde_json::{Value, json};
use std::collections::HashMap;

pub struct DocumentFactory {
    params: HashMap<String, Value>,
    fields: Fields,
}

impl DocumentFactory {
    pub fn new() -> Self {
        let mut params = HashMap::new();
        params.insert("container_id".into(), json!("stix_domain_objects"));
        params.insert("document_id".into(), json!("doc-1"));
        params.insert("entity_type".into(), json!("Attack-Pattern"));

        let mut fields = Fields::new();
        fields.insert("name".into(), json!("Spearphishing Attachment"));
        Self { params, fields }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn without_field(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    fn param(&self, key: &str) -> String {
        self.params[key].as_str().unwrap().to_string()
    }

    pub fn create(self) -> RawDocument {
        RawDocument {
            reference: DocumentRef::new(self.param("container_id"), self.param("document_id")),
            entity_type: self.param("entity_type"),
            fields: self.fields,
        }
    }

    /// Ids are zero-padded so scan order matches creation order. Each
    /// document gets an `index` field and a distinct `name`.
    pub fn create_list(self, count: usize) -> Vec<RawDocument> {
        let container = self.param("container_id");
        let entity_type = self.param("entity_type");
        let base_name = self.fields["name"].as_str().unwrap_or("doc").to_string();

        (0..count)
            .map(|i| {
                let mut fields = self.fields.clone();
                fields.insert("index".into(), json!(i));
                fields.insert("name".into(), json!(format!("{base_name} {i}")));
                RawDocument {
                    reference: DocumentRef::new(container.clone(), format!("doc-{i:05}")),
                    entity_type: entity_type.clone(),
                    fields,
                }
            })
            .collect()
    }
}
