use crate::engine::errors::RequestError;
use crate::engine::store::{
    BulkOperation, BulkOptions, ConflictPolicy, DocumentStore, MemoryStore, Script, ScriptEffect,
    UpdateByQuery,
};
use crate::engine::types::{DocumentRef, Fields, ScanFilter};
use crate::test_helpers::factory::Factory;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn bulk_options(refresh: bool) -> BulkOptions {
    BulkOptions {
        refresh,
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn fetch_page_walks_the_cursor() {
    let store = MemoryStore::with_documents(Factory::document().create_list(5));
    let filter = ScanFilter::new();

    let first = store.fetch_page(&filter, None, 2).await.unwrap();
    assert_eq!(first.documents.len(), 2);
    assert_eq!(first.next, Some(DocumentRef::new("stix_domain_objects", "doc-00001")));

    let second = store.fetch_page(&filter, first.next.as_ref(), 2).await.unwrap();
    assert_eq!(second.documents[0].reference.document_id, "doc-00002");

    let last = store.fetch_page(&filter, second.next.as_ref(), 2).await.unwrap();
    assert_eq!(last.documents.len(), 1);
    assert_eq!(last.next, None);
    assert_eq!(store.page_requests(), 3);
}

#[tokio::test]
async fn fetch_page_skips_non_matching_documents_within_a_page() {
    let docs: Vec<_> = (0..9)
        .map(|i| {
            let entity_type = if i % 3 == 0 { "Attack-Pattern" } else { "Malware" };
            Factory::document()
                .with("document_id", format!("doc-{i}"))
                .with("entity_type", entity_type)
                .create()
        })
        .collect();
    let store = MemoryStore::with_documents(docs);
    let filter = ScanFilter::new().with_entity_type("Attack-Pattern");

    let first = store.fetch_page(&filter, None, 2).await.unwrap();
    let ids: Vec<_> = first
        .documents
        .iter()
        .map(|doc| doc.reference.document_id.as_str())
        .collect();
    assert_eq!(ids, vec!["doc-0", "doc-3"]);
    assert_eq!(first.next, Some(DocumentRef::new("stix_domain_objects", "doc-3")));

    let rest = store.fetch_page(&filter, first.next.as_ref(), 2).await.unwrap();
    assert_eq!(rest.documents.len(), 1);
    assert_eq!(rest.documents[0].reference.document_id, "doc-6");
    assert_eq!(rest.next, None);
}

#[tokio::test]
async fn fetch_page_rejects_malformed_requests() {
    let store = MemoryStore::new();

    let blank = ScanFilter::new().with_entity_type("");
    assert!(matches!(
        store.fetch_page(&blank, None, 10).await,
        Err(RequestError::Rejected(_))
    ));
    assert!(matches!(
        store.fetch_page(&ScanFilter::new(), None, 0).await,
        Err(RequestError::Rejected(_))
    ));
}

#[tokio::test]
async fn bulk_write_merges_patches_and_reports_missing_documents() {
    let doc = Factory::document().create();
    let store = MemoryStore::with_documents([doc.clone()]);
    let missing = DocumentRef::new("stix_domain_objects", "ghost");

    let ops: Vec<BulkOperation> = vec![
        Factory::write_operation()
            .with("document_id", "doc-1")
            .with_patch("standard_id", "attack-pattern--1")
            .create()
            .into(),
        Factory::write_operation()
            .with("document_id", "ghost")
            .create()
            .into(),
    ];

    let outcomes = store.bulk_write(&ops, &bulk_options(true)).await.unwrap();

    assert!(outcomes[0].is_ok());
    assert_eq!(outcomes[1].reference, missing);
    assert_eq!(
        outcomes[1].error.as_deref(),
        Some("document_missing: stix_domain_objects/ghost")
    );

    let stored = store.get(&doc.reference).unwrap();
    assert_eq!(stored.fields["standard_id"], json!("attack-pattern--1"));
    assert_eq!(stored.fields["name"], doc.fields["name"]);
    assert_eq!(store.version(&doc.reference), Some(2));
    assert_eq!(store.refreshes(), 1);
}

#[tokio::test]
async fn bulk_write_rejects_empty_requests() {
    let store = MemoryStore::new();
    let result = store.bulk_write(&[], &bulk_options(false)).await;
    assert!(matches!(result, Err(RequestError::Rejected(_))));
    assert_eq!(store.bulk_requests(), 0);
}

#[tokio::test]
async fn update_by_query_runs_registered_script() {
    let docs = vec![
        Factory::document()
            .with("document_id", "a")
            .with_field("flag", 1)
            .create(),
        Factory::document().with("document_id", "b").create(),
    ];
    let store = MemoryStore::with_documents(docs);
    store.register_script(
        "bump",
        Arc::new(|fields: &mut Fields, params: &Fields| -> Result<ScriptEffect, String> {
            let by = params["by"].as_i64().unwrap_or(0);
            let current = fields.get("flag").and_then(|v| v.as_i64()).unwrap_or(0);
            fields.insert("flag".into(), json!(current + by));
            Ok(ScriptEffect::Updated)
        }),
    );

    let request = UpdateByQuery {
        filter: ScanFilter::new().with_required_field("flag"),
        script: Script::new("bump").with_param("by", 2),
        refresh: true,
        conflicts: ConflictPolicy::Proceed,
    };
    let report = store.update_by_query(&request).await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.version_conflicts, 0);
    let a = DocumentRef::new("stix_domain_objects", "a");
    assert_eq!(store.get(&a).unwrap().fields["flag"], json!(3));
    assert_eq!(store.version(&a), Some(2));
}

#[tokio::test]
async fn update_by_query_leaves_null_required_fields_alone() {
    let docs = vec![
        Factory::document()
            .with("document_id", "set")
            .with_field("flag", 1)
            .create(),
        Factory::document()
            .with("document_id", "null")
            .with_field("flag", serde_json::Value::Null)
            .create(),
    ];
    let store = MemoryStore::with_documents(docs);
    store.register_script(
        "touch",
        Arc::new(|fields: &mut Fields, _: &Fields| -> Result<ScriptEffect, String> {
            fields.insert("touched".into(), json!(true));
            Ok(ScriptEffect::Updated)
        }),
    );

    let request = UpdateByQuery {
        filter: ScanFilter::new().with_required_field("flag"),
        script: Script::new("touch"),
        refresh: true,
        conflicts: ConflictPolicy::Proceed,
    };
    let report = store.update_by_query(&request).await.unwrap();

    assert_eq!(report.total, 1);
    let null = DocumentRef::new("stix_domain_objects", "null");
    assert!(store.get(&null).unwrap().fields.get("touched").is_none());
    assert_eq!(store.version(&null), Some(1));
}

#[tokio::test]
async fn update_by_query_is_all_or_nothing() {
    let docs = Factory::document().create_list(3);
    let store = MemoryStore::with_documents(docs.clone());
    store.register_script(
        "explode_on_last",
        Arc::new(|fields: &mut Fields, _params: &Fields| -> Result<ScriptEffect, String> {
            if fields.get("index") == Some(&json!(2)) {
                return Err("boom".to_string());
            }
            fields.insert("touched".into(), json!(true));
            Ok(ScriptEffect::Updated)
        }),
    );

    let request = UpdateByQuery {
        filter: ScanFilter::new(),
        script: Script::new("explode_on_last"),
        refresh: false,
        conflicts: ConflictPolicy::Abort,
    };

    assert!(matches!(
        store.update_by_query(&request).await,
        Err(RequestError::Rejected(_))
    ));
    assert_eq!(store.documents(), docs);
}

#[tokio::test]
async fn update_by_query_rejects_unknown_script() {
    let store = MemoryStore::new();
    let request = UpdateByQuery {
        filter: ScanFilter::new(),
        script: Script::new("missing"),
        refresh: false,
        conflicts: ConflictPolicy::default(),
    };
    assert!(matches!(
        store.update_by_query(&request).await,
        Err(RequestError::Rejected(_))
    ));
}

#[test]
fn dump_round_trips_through_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("documents.json");
    let docs = Factory::document().create_list(4);

    MemoryStore::with_documents(docs.clone())
        .save_to_file(&path)
        .unwrap();
    let loaded = MemoryStore::load_from_file(&path).unwrap();

    assert_eq!(loaded.documents(), docs);
}
