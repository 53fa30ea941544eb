use crate::engine::store::{ConflictPolicy, DocumentStore, Script, UpdateByQuery};
use crate::engine::types::ScanFilter;
use crate::migrations::workflow_rename::RENAME_FIELD_SCRIPT;
use crate::test_helpers::factory::Factory;

#[test]
fn test_store_factory_loads_documents() {
    let docs = Factory::document().create_list(5);
    let store = Factory::store().with_documents(docs.clone()).create();

    assert_eq!(store.len(), 5);
    assert_eq!(store.get(&docs[4].reference), Some(docs[4].clone()));
    assert_eq!(store.version(&docs[4].reference), Some(1));
}

#[tokio::test]
async fn test_store_factory_with_scripts_registers_rename() {
    let store = Factory::store().with_scripts().create();
    let request = UpdateByQuery {
        filter: ScanFilter::new(),
        script: Script::new(RENAME_FIELD_SCRIPT)
            .with_param("from", "a")
            .with_param("to", "b"),
        refresh: false,
        conflicts: ConflictPolicy::Proceed,
    };

    let report = store.update_by_query(&request).await.unwrap();
    assert_eq!(report.total, 0);
}
