use indexmap::IndexSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::EntitySchema;

/// Set of field names a caller asked to receive.
///
/// Names are unique and kept in first-insertion order. The order only feeds
/// logging and the wire field list; equality ignores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FieldSet {
    names: IndexSet<String>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every field declared on the schema, in declaration order
    pub fn all(schema: &EntitySchema) -> Self {
        schema.field_names().collect()
    }

    /// Add a name; returns false if it was already present
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.names.iter()
    }

    /// Effective mask for a schema: names the schema does not declare are dropped
    pub fn restrict_to(&self, schema: &EntitySchema) -> FieldSet {
        let (known, unknown): (Vec<&String>, Vec<&String>) =
            self.names.iter().partition(|n| schema.declares(n));
        if !unknown.is_empty() {
            log::debug!(
                "ignoring fields not declared on {}: [{}]",
                schema.name(),
                unknown.iter().join(", ")
            );
        }
        known.into_iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for FieldSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Vec<String>> for FieldSet {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

impl From<FieldSet> for Vec<String> {
    fn from(set: FieldSet) -> Self {
        set.names.into_iter().collect()
    }
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;

    #[test]
    fn test_duplicates_collapse_and_order_is_kept() {
        let set: FieldSet = ["price", "name", "price"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "[price, name]");
    }

    #[test]
    fn test_equality_ignores_order() {
        let a: FieldSet = ["name", "price"].into_iter().collect();
        let b: FieldSet = ["price", "name"].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_restrict_to_drops_unknown_fields() {
        let schema = EntitySchema::new(
            "Product",
            [("id", FieldType::String), ("name", FieldType::String)],
        );
        let set: FieldSet = ["name", "bogus"].into_iter().collect();
        let expected: FieldSet = ["name"].into_iter().collect();
        assert_eq!(set.restrict_to(&schema), expected);
    }

    #[test]
    fn test_wire_format_is_a_plain_list() {
        let set: FieldSet = ["name", "price"].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["name","price"]"#);

        let parsed: FieldSet = serde_json::from_str(r#"["a","a","b"]"#).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_large_request_with_repeats_collapses() {
        // Every name appears twice; hashing keeps this linear in the input
        let names: Vec<String> = (0..200_000).map(|i| format!("f{}", i % 100_000)).collect();
        let set: FieldSet = names.into_iter().collect();
        assert_eq!(set.len(), 100_000);
        assert!(set.contains("f99999"));
        assert!(!set.contains("f100000"));
        assert_eq!(set.iter().next().map(String::as_str), Some("f0"));
    }
}
