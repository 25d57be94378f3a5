use crate::model::{Cart, Entity, Product, RawRecord, Value};
use crate::store::traits::RecordStore;
use anyhow::Result;

fn record(fields: impl IntoIterator<Item = (&'static str, Value)>) -> RawRecord {
    fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Demo products
pub fn seed_products() -> Vec<RawRecord> {
    vec![
        record([
            ("id", Value::from("p1")),
            ("name", Value::from("Widget")),
            ("price", Value::Float(9.99)),
            ("description", Value::from("A widget")),
        ]),
        record([
            ("id", Value::from("p2")),
            ("name", Value::from("Gadget")),
            ("price", Value::Float(24.5)),
            ("description", Value::Null),
        ]),
    ]
}

/// Demo carts
pub fn seed_carts() -> Vec<RawRecord> {
    vec![record([
        ("id", Value::from("c1")),
        ("product_id", Value::from("p1")),
        ("quantity", Value::Int(2)),
    ])]
}

/// Load all demo records into a store
pub async fn load_seed_data(store: &dyn RecordStore) -> Result<()> {
    for product in seed_products() {
        store.put_record(Product::schema(), product).await?;
    }
    for cart in seed_carts() {
        store.put_record(Cart::schema(), cart).await?;
    }
    Ok(())
}
