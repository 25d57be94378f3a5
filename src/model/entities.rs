use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::model::{EntitySchema, Field, FieldType, Value};

/// Assigns one raw value onto a typed entity
pub type Setter<E> = fn(&mut E, &Value);

/// Field name to setter mapping, prepared once per entity type
pub type SetterTable<E> = HashMap<&'static str, Setter<E>>;

/// A statically typed entity whose fields are tri-state slots.
///
/// Implementors start out fully absent (`Default`) and are populated one
/// field at a time through their setter table, so masking never needs a
/// match over field names at request time.
pub trait Entity: Default + Serialize + Sized + 'static {
    fn schema() -> &'static EntitySchema;
    fn setters() -> &'static SetterTable<Self>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Product {
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub id: Field<String>,
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub name: Field<String>,
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub price: Field<f64>,
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub description: Field<String>,
}

impl Entity for Product {
    fn schema() -> &'static EntitySchema {
        static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            EntitySchema::new(
                "Product",
                [
                    ("id", FieldType::String),
                    ("name", FieldType::String),
                    ("price", FieldType::Float),
                    ("description", FieldType::String),
                ],
            )
        })
    }

    fn setters() -> &'static SetterTable<Self> {
        static SETTERS: OnceLock<SetterTable<Product>> = OnceLock::new();
        SETTERS.get_or_init(|| {
            let setters: [(&'static str, Setter<Product>); 4] = [
                ("id", |p, v| p.id = Field::from_value(v)),
                ("name", |p, v| p.name = Field::from_value(v)),
                ("price", |p, v| p.price = Field::from_value(v)),
                ("description", |p, v| p.description = Field::from_value(v)),
            ];
            setters.into_iter().collect()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cart {
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub id: Field<String>,
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub product_id: Field<String>,
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub quantity: Field<i64>,
}

impl Entity for Cart {
    fn schema() -> &'static EntitySchema {
        static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            EntitySchema::new(
                "Cart",
                [
                    ("id", FieldType::String),
                    ("product_id", FieldType::String),
                    ("quantity", FieldType::Int),
                ],
            )
        })
    }

    fn setters() -> &'static SetterTable<Self> {
        static SETTERS: OnceLock<SetterTable<Cart>> = OnceLock::new();
        SETTERS.get_or_init(|| {
            let setters: [(&'static str, Setter<Cart>); 3] = [
                ("id", |c, v| c.id = Field::from_value(v)),
                ("product_id", |c, v| c.product_id = Field::from_value(v)),
                ("quantity", |c, v| c.quantity = Field::from_value(v)),
            ];
            setters.into_iter().collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_declared_field_has_a_setter() {
        for name in Product::schema().field_names() {
            assert!(Product::setters().contains_key(name), "missing setter for {}", name);
        }
        for name in Cart::schema().field_names() {
            assert!(Cart::setters().contains_key(name), "missing setter for {}", name);
        }
        assert_eq!(Product::setters().len(), Product::schema().fields().len());
    }

    #[test]
    fn test_absent_fields_are_omitted_from_json() {
        let product = Product {
            name: Field::Value("Widget".to_string()),
            description: Field::Null,
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&product).unwrap(),
            serde_json::json!({ "name": "Widget", "description": null })
        );
    }
}
