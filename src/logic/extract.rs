use log::info;

use crate::model::{FieldSet, SelectedField, Selection};

/// Derive the set of directly selected scalar fields under one root field.
///
/// Only plain leaf selections count. Aliased fields, fields with their own
/// sub-selection, fragment spreads and inline fragments are filtered out
/// without being recursed into.
pub fn extract(root: &SelectedField) -> FieldSet {
    let fields: FieldSet = root
        .selections
        .iter()
        .filter_map(|selection| match selection {
            Selection::Field(field) if field.is_leaf() => Some(field.name.as_str()),
            _ => None,
        })
        .collect();

    info!("[gateway] requested fields for {}: {}", root.name, fields);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::parse_operation;

    fn root_of(query: &str) -> SelectedField {
        parse_operation(query).unwrap().root_fields.remove(0)
    }

    #[test]
    fn test_extract_direct_scalar_fields() {
        let root = root_of(r#"{ product(id: "p1") { name price } }"#);
        let expected: FieldSet = ["name", "price"].into_iter().collect();
        assert_eq!(extract(&root), expected);
    }

    #[test]
    fn test_extract_filters_composite_selections() {
        let root = root_of(
            r#"{
              product(id: "p1") {
                name
                label: description
                owner { id }
                ...ProductBits
                ... on Product { price }
              }
            }"#,
        );

        let fields = extract(&root);
        assert_eq!(fields.iter().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_extract_empty_selection() {
        let root = root_of(r#"{ product(id: "p1") { } }"#);
        assert!(extract(&root).is_empty());

        let bare = SelectedField::new("product");
        assert!(extract(&bare).is_empty());
    }

    #[test]
    fn test_extract_deduplicates() {
        let root = root_of(r#"{ cart(id: "c1") { quantity id quantity } }"#);
        assert_eq!(extract(&root).to_string(), "[quantity, id]");
    }
}
