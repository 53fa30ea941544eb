use crate::test_helpers::factory::Factory;
use serde_json::json;

#[test]
fn test_write_operation_factory() {
    let op = Factory::write_operation()
        .with("document_id", "doc-7")
        .with_patch("standard_id", "attack-pattern--x")
        .create();

    assert_eq!(op.reference.to_string(), "stix_domain_objects/doc-7");
    assert_eq!(op.patch["standard_id"], json!("attack-pattern--x"));
    assert_eq!(op.patch["migrated"], json!(true));
}

#[test]
fn test_write_operation_factory_create_list() {
    let ops = Factory::write_operation().create_list(3);

    assert_eq!(ops.len(), 3);
    assert_eq!(ops[2].reference.document_id, "doc-00002");
    assert_eq!(ops[2].patch["seq"], json!(2));
}
