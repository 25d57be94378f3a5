use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;

use crate::model::{EntitySchema, FieldSet, RawRecord, SchemaRegistry, KEY_FIELD};
use crate::store::RecordStore;

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: String, key: String },

    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("invalid {entity} record: {reason}")]
    InvalidRecord { entity: String, reason: String },

    #[error("backing store failure: {0}")]
    Store(#[from] anyhow::Error),
}

/// Masked record together with the mask that produced it, so the caller
/// can re-apply the same mask independently
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMaskResponse {
    pub record: RawRecord,
    pub fields: FieldSet,
}

/// Backend side of the field-mask contract.
///
/// Each call is an independent fetch, mask, return cycle. The store is the
/// only shared resource and is used once per call.
pub struct FieldMaskResponder {
    store: Arc<dyn RecordStore>,
    schemas: Arc<SchemaRegistry>,
}

impl FieldMaskResponder {
    pub fn new(store: Arc<dyn RecordStore>, schemas: Arc<SchemaRegistry>) -> Self {
        Self { store, schemas }
    }

    fn schema(&self, entity: &str) -> Result<Arc<EntitySchema>, ResponderError> {
        self.schemas
            .get(entity)
            .ok_or_else(|| ResponderError::UnknownEntity(entity.to_string()))
    }

    /// Fetch the record stored under `key` and return only the fields in `fields`
    pub async fn respond(
        &self,
        entity: &str,
        key: &str,
        fields: FieldSet,
    ) -> Result<FieldMaskResponse, ResponderError> {
        let schema = self.schema(entity)?;
        info!(
            "[backend] get {} request: key={}, fields={}",
            schema.name(),
            key,
            fields
        );

        let full = self
            .store
            .get_record(&schema, key)
            .await?
            .ok_or_else(|| ResponderError::NotFound {
                entity: schema.name().to_string(),
                key: key.to_string(),
            })?;

        let record = apply_mask(&schema, &full, &fields);
        info!(
            "[backend] returning {}: {}",
            schema.name(),
            serde_json::to_string(&record).unwrap_or_default()
        );

        Ok(FieldMaskResponse { record, fields })
    }

    /// Validate and store a fully specified record. Writes are never masked.
    ///
    /// Every declared field must be present; unknown values are sent as
    /// explicit nulls. Stores therefore never hold a partial row.
    pub async fn upsert(&self, entity: &str, record: RawRecord) -> Result<RawRecord, ResponderError> {
        let schema = self.schema(entity)?;
        validate_record(&schema, &record)?;

        info!(
            "[backend] upsert {} '{}'",
            schema.name(),
            record.get(KEY_FIELD).and_then(|v| v.as_str()).unwrap_or_default()
        );
        self.store.put_record(&schema, record.clone()).await?;
        Ok(record)
    }
}

/// Copy onto an empty record exactly the requested fields that the schema
/// declares and the full record holds.
///
/// Each assignment touches a distinct key, so the order of `fields` has no
/// effect on the result.
pub fn apply_mask(schema: &EntitySchema, full: &RawRecord, fields: &FieldSet) -> RawRecord {
    let mut masked = RawRecord::new();
    for name in fields.iter() {
        if !schema.declares(name) {
            debug!("[backend] {} has no field '{}', skipping", schema.name(), name);
            continue;
        }
        if let Some(value) = full.get(name) {
            masked.insert(name.clone(), value.clone());
        }
    }
    masked
}

fn validate_record(schema: &EntitySchema, record: &RawRecord) -> Result<(), ResponderError> {
    let invalid = |reason: String| ResponderError::InvalidRecord {
        entity: schema.name().to_string(),
        reason,
    };

    match record.get(KEY_FIELD).and_then(|v| v.as_str()) {
        Some(key) if !key.is_empty() => {}
        _ => return Err(invalid(format!("'{}' must be a non-empty string", KEY_FIELD))),
    }

    let missing: Vec<&str> = schema
        .field_names()
        .filter(|name| !record.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(invalid(format!("missing fields: {}", missing.join(", "))));
    }

    for (name, value) in record {
        let def = schema
            .field(name)
            .ok_or_else(|| invalid(format!("unknown field '{}'", name)))?;
        if !value.conforms_to(&def.ty) {
            return Err(invalid(format!("field '{}' expects {:?}, got {}", name, def.ty, value)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::build;
    use crate::model::{Cart, Entity, Field, Product, Value};
    use crate::store::MemoryStore;

    fn full_product() -> RawRecord {
        RawRecord::from([
            ("id".to_string(), Value::from("p1")),
            ("name".to_string(), Value::from("Widget")),
            ("price".to_string(), Value::Float(9.99)),
            ("description".to_string(), Value::from("A widget")),
        ])
    }

    fn fields(names: &[&str]) -> FieldSet {
        names.iter().copied().collect()
    }

    async fn responder() -> FieldMaskResponder {
        let store = MemoryStore::new();
        store.put_record(Product::schema(), full_product()).await.unwrap();
        FieldMaskResponder::new(Arc::new(store), Arc::new(SchemaRegistry::builtin()))
    }

    #[tokio::test]
    async fn test_respond_masks_record() {
        let responder = responder().await;
        let response = responder
            .respond("product", "p1", fields(&["name", "price"]))
            .await
            .unwrap();

        assert_eq!(
            response.record,
            RawRecord::from([
                ("name".to_string(), Value::from("Widget")),
                ("price".to_string(), Value::Float(9.99)),
            ])
        );
        assert_eq!(response.fields, fields(&["name", "price"]));
    }

    #[tokio::test]
    async fn test_respond_missing_key_is_not_found() {
        let responder = responder().await;
        let err = responder
            .respond("product", "missing-key", fields(&["name"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ResponderError::NotFound { ref key, .. } if key == "missing-key"));
    }

    #[tokio::test]
    async fn test_respond_unknown_entity() {
        let responder = responder().await;
        let err = responder
            .respond("order", "o1", fields(&["id"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResponderError::UnknownEntity(_)));
    }

    #[tokio::test]
    async fn test_mask_round_trip_matches_direct_build() {
        let responder = responder().await;
        let schema = Product::schema();
        let subsets: [&[&str]; 5] = [
            &[],
            &["id"],
            &["name", "price"],
            &["description", "id", "price"],
            &["id", "name", "price", "description"],
        ];

        for subset in subsets {
            let requested = fields(subset);
            let response = responder
                .respond("product", "p1", requested.clone())
                .await
                .unwrap();
            assert_eq!(
                build(schema, &response.record, &requested),
                build(schema, &full_product(), &requested),
                "round trip differs for {}",
                requested
            );
        }
    }

    #[test]
    fn test_apply_mask_ignores_order_and_unknown_fields() {
        let schema = Product::schema();
        let forward = apply_mask(schema, &full_product(), &fields(&["name", "bogus", "id"]));
        let backward = apply_mask(schema, &full_product(), &fields(&["id", "name"]));
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_validates_record() {
        let responder = responder().await;

        let mut record = full_product();
        record.insert("price".to_string(), Value::from("cheap"));
        assert!(matches!(
            responder.upsert("product", record).await,
            Err(ResponderError::InvalidRecord { .. })
        ));

        let mut record = full_product();
        record.insert("bogus".to_string(), Value::Bool(true));
        assert!(responder.upsert("product", record).await.is_err());

        let mut record = full_product();
        record.insert("name".to_string(), Value::from("Gizmo"));
        responder.upsert("product", record).await.unwrap();

        let response = responder
            .respond("product", "p1", fields(&["name"]))
            .await
            .unwrap();
        assert_eq!(response.record["name"], Value::from("Gizmo"));
    }

    #[tokio::test]
    async fn test_partial_upsert_is_rejected() {
        let responder = responder().await;
        let partial = RawRecord::from([
            ("id".to_string(), Value::from("c9")),
            ("quantity".to_string(), Value::Int(3)),
        ]);

        let err = responder.upsert("cart", partial).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid Cart record: missing fields: product_id");

        // Nothing was written
        let err = responder
            .respond("cart", "c9", fields(&["quantity"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResponderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_explicit_null_reads_back_as_null() {
        let responder = responder().await;
        let record = RawRecord::from([
            ("id".to_string(), Value::from("c9")),
            ("product_id".to_string(), Value::Null),
            ("quantity".to_string(), Value::Int(3)),
        ]);
        responder.upsert("cart", record).await.unwrap();

        let response = responder
            .respond("cart", "c9", fields(&["product_id", "quantity"]))
            .await
            .unwrap();
        assert_eq!(response.record["product_id"], Value::Null);

        // Same shape a Postgres row with a NULL column decodes to
        let cart = build(Cart::schema(), &response.record, &response.fields);
        assert_eq!(cart.get("product_id"), Some(&Field::Null));
        assert_eq!(cart.get("quantity"), Some(&Field::Value(Value::Int(3))));
    }
}
