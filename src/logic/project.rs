use crate::model::{Entity, EntitySchema, Field, FieldSet, ProjectedObject, RawRecord, Value};

/// Build a projected object holding values only for requested fields.
///
/// Every declared field outside `field_set` is forced absent even when
/// `record` carries a value for it, so an over-fetching backend can never
/// leak fields the caller did not ask for. Names in `field_set` that the
/// schema does not declare are ignored.
pub fn build(schema: &EntitySchema, record: &RawRecord, field_set: &FieldSet) -> ProjectedObject {
    let slots = schema
        .fields()
        .iter()
        .map(|def| {
            let slot = if field_set.contains(&def.name) {
                read_field(record, &def.name)
            } else {
                Field::Absent
            };
            (def.name.clone(), slot)
        })
        .collect();

    ProjectedObject::new(slots)
}

/// Typed counterpart of [`build`], populating `E` through its setter table
pub fn build_entity<E: Entity>(record: &RawRecord, field_set: &FieldSet) -> E {
    let setters = E::setters();
    let mut entity = E::default();

    for name in field_set.iter() {
        if let (Some(set), Some(value)) = (setters.get(name.as_str()), record.get(name)) {
            set(&mut entity, value);
        }
    }

    entity
}

fn read_field(record: &RawRecord, name: &str) -> Field<Value> {
    match record.get(name) {
        None => Field::Absent,
        Some(Value::Null) => Field::Null,
        Some(value) => Field::Value(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cart, Product};

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

    #[test]
    fn test_build_product_scenario() {
        let built = build(Product::schema(), &full_product(), &fields(&["name", "price"]));

        assert_eq!(built.get("id"), Some(&Field::Absent));
        assert_eq!(built.get("name"), Some(&Field::Value(Value::from("Widget"))));
        assert_eq!(built.get("price"), Some(&Field::Value(Value::Float(9.99))));
        assert_eq!(built.get("description"), Some(&Field::Absent));
        assert_eq!(
            serde_json::to_value(&built).unwrap(),
            serde_json::json!({ "name": "Widget", "price": 9.99 })
        );
    }

    #[test]
    fn test_non_absent_fields_are_the_intersection() {
        let schema = Product::schema();
        let mut record = full_product();
        record.remove("description");
        record.insert("extra".to_string(), Value::from("ignored"));

        let requested = fields(&["id", "description", "extra", "bogus"]);
        let built = build(schema, &record, &requested);

        assert_eq!(built.present_fields(), vec!["id"]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let requested = fields(&["id", "price"]);
        let first = build(Product::schema(), &full_product(), &requested);
        let second = build(Product::schema(), &full_product(), &requested);
        assert_eq!(first, second);
    }

    #[test]
    fn test_values_outside_field_set_never_leak() {
        let requested = fields(&["name"]);
        let mut without_extra = RawRecord::new();
        without_extra.insert("name".to_string(), Value::from("Widget"));

        assert_eq!(
            build(Product::schema(), &full_product(), &requested),
            build(Product::schema(), &without_extra, &requested)
        );
    }

    #[test]
    fn test_empty_field_set_yields_all_absent() {
        let built = build(Product::schema(), &full_product(), &FieldSet::new());
        assert!(built.present_fields().is_empty());
        assert_eq!(built.slots().len(), 4);
    }

    #[test]
    fn test_unknown_field_is_ignored() {
        assert_eq!(
            build(Product::schema(), &full_product(), &fields(&["name", "bogus"])),
            build(Product::schema(), &full_product(), &fields(&["name"]))
        );
    }

    #[test]
    fn test_requested_null_is_distinct_from_absent() {
        let mut record = full_product();
        record.insert("description".to_string(), Value::Null);

        let built = build(Product::schema(), &record, &fields(&["description"]));
        assert_eq!(built.get("description"), Some(&Field::Null));
        assert_eq!(
            serde_json::to_value(&built).unwrap(),
            serde_json::json!({ "description": null })
        );
    }

    #[test]
    fn test_build_entity_typed() {
        let product: Product = build_entity(&full_product(), &fields(&["name", "price"]));
        assert_eq!(
            product,
            Product {
                name: Field::Value("Widget".to_string()),
                price: Field::Value(9.99),
                ..Default::default()
            }
        );

        let record = RawRecord::from([
            ("id".to_string(), Value::from("c1")),
            ("product_id".to_string(), Value::from("p1")),
            ("quantity".to_string(), Value::Int(2)),
        ]);
        let cart: Cart = build_entity(&record, &fields(&["quantity", "bogus"]));
        assert_eq!(cart.quantity, Field::Value(2));
        assert!(cart.id.is_absent());
        assert!(cart.product_id.is_absent());
    }
}
