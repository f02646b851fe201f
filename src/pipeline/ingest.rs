//! Freshness, deduplication, identifier assignment and persistence of a
//! crawl's buffered records.
//!
//! Runs once per crawl, after every worker has finished. There is no
//! isolation between reading the existing records and writing the new ones;
//! a concurrent writer in between could still produce a duplicate.

use super::dedup::{ExistingKeys, dedup_batch, filter_existing};
use super::freshness::FreshnessFilter;
use crate::errors::HarvestError;
use crate::models::{ArticleRecord, PersistedRecord};
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    pub freshness: FreshnessFilter,
    /// Reject records with any field invalid for its declared type.
    pub drop_invalid_records: bool,
}

/// Counts from one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records handed over by the crawl.
    pub buffered: usize,
    /// Records surviving the freshness (and validity) filter.
    pub considered: usize,
    /// Documents already in the store.
    pub existing: usize,
    /// Documents written by this pass.
    pub inserted: usize,
}

pub struct IngestionPipeline<'a, S> {
    store: &'a S,
    options: IngestOptions,
}

impl<'a, S: RecordStore> IngestionPipeline<'a, S> {
    /// Create a pipeline writing to `store`.
    ///
    /// # Arguments
    ///
    /// * `store` - Record store read once for comparison and written once
    /// * `options` - Freshness window and invalid-record policy
    pub fn new(store: &'a S, options: IngestOptions) -> Self {
        Self { store, options }
    }

    pub async fn ingest(&self, records: Vec<ArticleRecord>) -> Result<IngestReport, HarvestError> {
        self.ingest_at(records, Utc::now()).await
    }

    /// Run the pipeline with `now` as the freshness reference.
    ///
    /// # Errors
    ///
    /// [`HarvestError::ReadExisting`] if the comparison snapshot cannot be
    /// read (nothing is written), [`HarvestError::Insert`] if the batch write
    /// fails.
    #[instrument(level = "info", skip_all, fields(buffered = records.len()))]
    pub async fn ingest_at(
        &self,
        records: Vec<ArticleRecord>,
        now: DateTime<Utc>,
    ) -> Result<IngestReport, HarvestError> {
        let mut report = IngestReport {
            buffered: records.len(),
            ..Default::default()
        };

        let mut fresh = self.options.freshness.retain(records, now);
        if self.options.drop_invalid_records {
            fresh.retain(|record| {
                if !record.is_valid() {
                    warn!(url = %record.url, fields = ?record.invalid_fields, "Dropping record with invalid fields");
                }
                record.is_valid()
            });
        }
        report.considered = fresh.len();

        let existing = self
            .store
            .find_all()
            .await
            .map_err(HarvestError::ReadExisting)?;
        report.existing = existing.len();
        info!(considered = report.considered, existing = report.existing, "Comparing against stored records");

        let keys = ExistingKeys::from_persisted(&existing);
        let new_records = filter_existing(dedup_batch(fresh), &keys);
        let with_ids: Vec<PersistedRecord> =
            new_records.into_iter().map(PersistedRecord::assign).collect();

        if !with_ids.is_empty() {
            report.inserted = self
                .store
                .insert_many(with_ids)
                .await
                .map_err(HarvestError::Insert)?;
        }

        info!(inserted = report.inserted, "Ingestion complete");
        Ok(report)
    }
}
