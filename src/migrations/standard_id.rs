//! Rewrites `standard_id` for attack patterns and courses of action, and
//! clears their `x_opencti_stix_ids`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::engine::errors::{MigrationError, TransformError};
use crate::engine::migration::{Migration, MigrationContext, MigrationOutcome};
use crate::engine::runner::MigrationRunner;
use crate::engine::types::{RawDocument, ScanFilter, WriteOperation};

pub const NAME: &str = "1611671597858-standard_id";

pub const CONTAINER: &str = "stix_domain_objects";
pub const ENTITY_TYPE_ATTACK_PATTERN: &str = "Attack-Pattern";
pub const ENTITY_TYPE_COURSE_OF_ACTION: &str = "Course-Of-Action";

/// OASIS STIX 2.1 namespace for deterministic identifiers.
const STIX_NAMESPACE: Uuid = Uuid::from_u128(0x00abedb4_aa42_466c_9c01_fed23315a9b7);

pub struct StandardIdRewrite;

impl StandardIdRewrite {
    pub fn filter() -> ScanFilter {
        ScanFilter::new()
            .with_container(CONTAINER)
            .with_entity_type(ENTITY_TYPE_ATTACK_PATTERN)
            .with_entity_type(ENTITY_TYPE_COURSE_OF_ACTION)
    }
}

#[async_trait]
impl Migration for StandardIdRewrite {
    fn name(&self) -> &str {
        NAME
    }

    async fn up(&self, ctx: &MigrationContext) -> Result<MigrationOutcome, MigrationError> {
        let runner = MigrationRunner::new(
            "Rewriting standard ids for Attack pattern and Course of action",
            Arc::clone(&ctx.store),
            Self::filter(),
            Arc::new(rewrite_standard_id),
            ctx.options.clone(),
        )
        .with_cancellation(ctx.cancel.clone());

        runner.up().await.map(MigrationOutcome::Streamed)
    }
}

/// Patch for one document, empty when it already carries the right id.
pub fn rewrite_standard_id(doc: &RawDocument) -> Result<Vec<WriteOperation>, TransformError> {
    let standard_id = generate_standard_id(doc)?;
    let cleared = doc
        .field("x_opencti_stix_ids")
        .and_then(Value::as_array)
        .is_some_and(|ids| ids.is_empty());

    if doc.str_field("standard_id") == Some(standard_id.as_str()) && cleared {
        return Ok(Vec::new());
    }

    Ok(vec![WriteOperation::update(
        doc,
        [
            ("standard_id", Value::String(standard_id)),
            ("x_opencti_stix_ids", json!([])),
        ],
    )])
}

/// `<stix-type>--<uuid v5>` over the first contributing property present:
/// `x_mitre_id`, then the normalized `name`.
pub fn generate_standard_id(doc: &RawDocument) -> Result<String, TransformError> {
    let stix_type = match doc.entity_type.as_str() {
        ENTITY_TYPE_ATTACK_PATTERN => "attack-pattern",
        ENTITY_TYPE_COURSE_OF_ACTION => "course-of-action",
        other => {
            return Err(TransformError::UnsupportedEntityType {
                reference: doc.reference.clone(),
                entity_type: other.to_string(),
            });
        }
    };

    let contribution = if let Some(mitre_id) = doc.str_field("x_mitre_id") {
        json!({ "x_mitre_id": mitre_id.trim() })
    } else if let Some(name) = doc.str_field("name") {
        json!({ "name": name.trim().to_lowercase() })
    } else {
        return Err(TransformError::MissingField {
            reference: doc.reference.clone(),
            field: "name".to_string(),
        });
    };

    let uuid = Uuid::new_v5(&STIX_NAMESPACE, contribution.to_string().as_bytes());
    Ok(format!("{stix_type}--{uuid}"))
}
