use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::{Cart, Entity, Product};

/// Name of the field every entity is keyed by
pub const KEY_FIELD: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Boolean,
    /// Nested entity, referenced by schema name
    Entity(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

/// Named entity type with an ordered list of declared fields.
/// Defined once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    name: String,
    fields: Vec<FieldDef>,
}

impl EntitySchema {
    pub fn new<'a>(name: &str, fields: impl IntoIterator<Item = (&'a str, FieldType)>) -> Self {
        Self {
            name: name.to_string(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| FieldDef {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Table backing this entity in SQL stores
    pub fn table_name(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Registry of entity schemas, looked up case-insensitively by name
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<EntitySchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the entities served out of the box
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Product::schema().clone());
        registry.register(Cart::schema().clone());
        registry
    }

    pub fn register(&mut self, schema: EntitySchema) {
        self.schemas
            .insert(schema.name().to_lowercase(), Arc::new(schema));
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntitySchema>> {
        self.schemas.get(&name.to_lowercase()).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntitySchema>> {
        self.schemas.values()
    }
}
