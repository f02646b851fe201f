//! Collection maintenance: age-based cleanup, JSON backup and restore.
//!
//! # Backup file layout
//!
//! ```text
//! {
//!   "timestamp": "2025-05-06T03:00:00Z",
//!   "database": "news",
//!   "collection": "articles",
//!   "count": 2,
//!   "data": [ { "_id": "...", "sourceUrl": "...", ... }, ... ]
//! }
//! ```

use crate::errors::StoreError;
use crate::models::PersistedRecord;
use crate::store::RecordStore;
use crate::utils::ensure_writable_dir;
use chrono::{DateTime, Months, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Default number of months kept by [`cleanup_old_entries`].
pub const DEFAULT_MONTHS_TO_KEEP: u32 = 3;

/// Delete records dated more than `months_to_keep` calendar months before `now`.
///
/// # Arguments
///
/// * `store` - The record store to prune
/// * `months_to_keep` - Calendar months of records kept
/// * `now` - Reference instant for the cutoff
///
/// # Returns
///
/// The number of deleted records. Records with unparsable dates are kept.
#[instrument(level = "info", skip(store))]
pub async fn cleanup_old_entries<S: RecordStore>(
    store: &S,
    months_to_keep: u32,
    now: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let cutoff = now
        .checked_sub_months(Months::new(months_to_keep))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    info!(%cutoff, "Deleting entries older than cutoff");

    let deleted = store.delete_dated_before(cutoff).await?;
    if deleted == 0 {
        info!("No entries to delete");
    } else {
        info!(deleted, "Deleted old entries");
    }
    Ok(deleted)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupFile {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub count: Option<usize>,
    pub data: Vec<PersistedRecord>,
}

/// Write every record of `store` to `backup_file`.
///
/// Returns the number of records written; an empty collection writes nothing.
#[instrument(level = "info", skip(store, backup_file), fields(backup_file = %backup_file.display()))]
pub async fn backup_collection<S: RecordStore>(
    store: &S,
    database: &str,
    collection: &str,
    backup_file: &Path,
) -> Result<usize, Box<dyn Error>> {
    let documents = store.find_all().await?;
    info!(count = documents.len(), "Fetched documents for backup");
    if documents.is_empty() {
        info!("No documents to backup");
        return Ok(0);
    }

    if let Some(dir) = backup_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(dir = %dir.display(), error = %e, "Backup directory is not writable");
            return Err(e.into());
        }
    }

    let backup = BackupFile {
        timestamp: Some(Utc::now()),
        database: Some(database.to_string()),
        collection: Some(collection.to_string()),
        count: Some(documents.len()),
        data: documents,
    };
    let json = serde_json::to_string_pretty(&backup)?;
    fs::write(backup_file, json).await?;

    info!(count = backup.data.len(), "Backup written");
    Ok(backup.data.len())
}

/// How a restore treats documents already in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RestoreMode {
    /// Delete everything, then insert the backup.
    Replace,
    /// Insert only documents whose `_id` is not present yet.
    Merge,
}

/// Counts from a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    pub deleted: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub final_count: usize,
}

/// Load `backup_file` into `store`.
#[instrument(level = "info", skip(store, backup_file), fields(backup_file = %backup_file.display()))]
pub async fn restore_collection<S: RecordStore>(
    store: &S,
    backup_file: &Path,
    mode: RestoreMode,
) -> Result<RestoreReport, Box<dyn Error>> {
    let body = match fs::read_to_string(backup_file).await {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Cannot read backup file");
            return Err(e.into());
        }
    };
    let backup: BackupFile = serde_json::from_str(&body)?;
    info!(
        timestamp = ?backup.timestamp,
        database = ?backup.database,
        collection = ?backup.collection,
        count = backup.data.len(),
        "Read backup file"
    );

    let total = backup.data.len();
    let mut report = RestoreReport {
        deleted: 0,
        inserted: 0,
        skipped: 0,
        final_count: 0,
    };

    let to_insert = match mode {
        RestoreMode::Replace => {
            report.deleted = store.delete_all().await?;
            info!(deleted = report.deleted, "Deleted existing documents");
            backup.data
        }
        RestoreMode::Merge => {
            let existing: HashSet<_> = store.find_all().await?.into_iter().map(|p| p.id).collect();
            info!(existing = existing.len(), "Merging with existing documents");
            backup
                .data
                .into_iter()
                .filter(|doc| !existing.contains(&doc.id))
                .collect()
        }
    };
    report.skipped = total - to_insert.len();

    if !to_insert.is_empty() {
        report.inserted = store.insert_many(to_insert).await?;
    }
    report.final_count = store.count().await?;

    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        final_count = report.final_count,
        "Restore complete"
    );
    Ok(report)
}
