//! Record store persisted as a JSON array on disk.
//!
//! One collection lives at `{store_dir}/{database}/{collection}.json`. Every
//! write replaces the file atomically (temp file + rename); an async mutex
//! serializes access within the process.

use super::{RecordStore, dated_before};
use crate::errors::StoreError;
use crate::models::PersistedRecord;
use crate::utils::ensure_writable_dir;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (creating if needed) a collection under `store_dir`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] when the database directory cannot be
    /// created or written.
    #[instrument(level = "info", skip_all, fields(store_dir = %store_dir.display(), %database, %collection))]
    pub async fn open(
        store_dir: &Path,
        database: &str,
        collection: &str,
    ) -> Result<Self, StoreError> {
        let dir = store_dir.join(database);
        ensure_writable_dir(&dir)
            .await
            .map_err(|source| StoreError::Unavailable {
                path: dir.display().to_string(),
                source,
            })?;

        let path = dir.join(format!("{collection}.json"));
        info!(path = %path.display(), "Opened record store");
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<PersistedRecord>, StoreError> {
        let body = match fs::read_to_string(&self.path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn save(&self, records: &[PersistedRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), count = records.len(), "Saved collection");
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    async fn find_all(&self) -> Result<Vec<PersistedRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn insert_many(&self, records: Vec<PersistedRecord>) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let count = records.len();
        let mut all = self.load().await?;
        all.extend(records);
        self.save(&all).await?;
        Ok(count)
    }

    async fn delete_dated_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all = self.load().await?;
        let before = all.len();
        all.retain(|record| !dated_before(record, cutoff));
        let deleted = before - all.len();
        if deleted > 0 {
            self.save(&all).await?;
        }
        Ok(deleted)
    }

    async fn delete_all(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let count = self.load().await?.len();
        self.save(&[]).await?;
        Ok(count)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.len())
    }
}
