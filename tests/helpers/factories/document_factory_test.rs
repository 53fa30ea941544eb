use crate::test_helpers::factory::Factory;
use serde_json::json;

#[test]
fn test_document_factory() {
    let doc = Factory::document()
        .with("container_id", "internal_objects")
        .with("document_id", "abc")
        .with("entity_type", "Course-Of-Action")
        .with_field("x_mitre_id", "T1566")
        .create();

    assert_eq!(doc.reference.container_id, "internal_objects");
    assert_eq!(doc.reference.document_id, "abc");
    assert_eq!(doc.entity_type, "Course-Of-Action");
    assert_eq!(doc.field("x_mitre_id"), Some(&json!("T1566")));
    assert!(doc.field("name").is_some());
}

#[test]
fn test_document_factory_create_list_orders_ids() {
    let docs = Factory::document().without_field("name").create_list(12);

    assert_eq!(docs.len(), 12);
    assert_eq!(docs[0].reference.document_id, "doc-00000");
    assert_eq!(docs[11].reference.document_id, "doc-00011");
    assert!(docs.windows(2).all(|w| w[0].reference < w[1].reference));
    assert_eq!(docs[3].field("index"), Some(&json!(3)));
    assert_eq!(docs[3].field("name"), Some(&json!("doc 3")));
}
