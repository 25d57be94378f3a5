use crate::model::{EntitySchema, RawRecord};
use anyhow::Result;

/// Key-based record access behind a backend service
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the full record stored under `key`, or `None` if there is none
    async fn get_record(&self, schema: &EntitySchema, key: &str) -> Result<Option<RawRecord>>;
    /// Insert or replace a record, keyed by its `id` field
    async fn put_record(&self, schema: &EntitySchema, record: RawRecord) -> Result<()>;
}
