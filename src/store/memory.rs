//! In-process record store.

use super::{RecordStore, dated_before};
use crate::errors::StoreError;
use crate::models::PersistedRecord;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<PersistedRecord>>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<PersistedRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl RecordStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<PersistedRecord>, StoreError> {
        Ok(self.records.lock().await.clone())
    }

    async fn insert_many(&self, records: Vec<PersistedRecord>) -> Result<usize, StoreError> {
        let count = records.len();
        self.records.lock().await.extend(records);
        Ok(count)
    }

    async fn delete_dated_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| !dated_before(record, cutoff));
        Ok(before - records.len())
    }

    async fn delete_all(&self) -> Result<usize, StoreError> {
        let mut records = self.records.lock().await;
        let count = records.len();
        records.clear();
        Ok(count)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.lock().await.len())
    }
}
