use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::model::{EntitySchema, RawRecord, KEY_FIELD};
use crate::store::traits::RecordStore;

/// In-process record store keyed by (table, id)
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<(String, String), RawRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn get_record(&self, schema: &EntitySchema, key: &str) -> Result<Option<RawRecord>> {
        let records = self.records.read();
        Ok(records
            .get(&(schema.table_name(), key.to_string()))
            .cloned())
    }

    async fn put_record(&self, schema: &EntitySchema, record: RawRecord) -> Result<()> {
        let key = record
            .get(KEY_FIELD)
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("{} record has no string '{}'", schema.name(), KEY_FIELD))?
            .to_string();

        self.records.write().insert((schema.table_name(), key), record);
        Ok(())
    }
}
