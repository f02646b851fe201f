//! Duplicate removal within a batch and against the store.
//!
//! Two records are duplicates when they share a `url` OR a `headline`.

use crate::models::{ArticleRecord, PersistedRecord};
use std::collections::HashSet;
use tracing::debug;

/// Keep a record only if no earlier record in the batch shares its url or
/// headline. Idempotent.
pub fn dedup_batch(records: Vec<ArticleRecord>) -> Vec<ArticleRecord> {
    let mut seen_urls: HashSet<String> = HashSet::with_capacity(records.len());
    let mut seen_headlines: HashSet<String> = HashSet::with_capacity(records.len());

    records
        .into_iter()
        .filter(|record| {
            let duplicate =
                seen_urls.contains(&record.url) || seen_headlines.contains(&record.headline);
            seen_urls.insert(record.url.clone());
            seen_headlines.insert(record.headline.clone());
            if duplicate {
                debug!(url = %record.url, "Dropping duplicate within batch");
            }
            !duplicate
        })
        .collect()
}

/// URLs and headlines already held by the store.
#[derive(Debug, Default)]
pub struct ExistingKeys {
    urls: HashSet<String>,
    headlines: HashSet<String>,
}

impl ExistingKeys {
    pub fn from_persisted(existing: &[PersistedRecord]) -> Self {
        Self {
            urls: existing.iter().map(|p| p.record.url.clone()).collect(),
            headlines: existing.iter().map(|p| p.record.headline.clone()).collect(),
        }
    }

    pub fn contains(&self, record: &ArticleRecord) -> bool {
        self.urls.contains(&record.url) || self.headlines.contains(&record.headline)
    }
}

/// Drop every record whose url or headline is already stored.
pub fn filter_existing(records: Vec<ArticleRecord>, existing: &ExistingKeys) -> Vec<ArticleRecord> {
    records
        .into_iter()
        .filter(|record| {
            if existing.contains(record) {
                return false;
            }
            debug!(url = %record.url, "New record");
            true
        })
        .collect()
}
