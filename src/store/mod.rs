//! Persistence collaborators: the record store and the site configuration store.
//!
//! Both are traits so the pipeline can run against the on-disk
//! [`JsonFileStore`] in production and an in-memory store in tests.
//!
//! | Store | Module | Backing |
//! |-------|--------|---------|
//! | Records | [`json`] | `{store_dir}/{database}/{collection}.json` |
//! | Records | `memory` (tests) | in-process `Vec` |
//! | Site configs | [`sites`] | YAML file |

pub mod json;
#[cfg(test)]
pub mod memory;
pub mod sites;

use crate::errors::StoreError;
use crate::models::{PersistedRecord, SiteConfig};
use chrono::{DateTime, Utc};

pub use json::JsonFileStore;
#[cfg(test)]
pub use memory::MemoryStore;
pub use sites::YamlConfigStore;

/// A collection of persisted article documents.
///
/// Only insert-if-new semantics are used; documents are never updated.
pub trait RecordStore {
    /// Every document currently stored.
    async fn find_all(&self) -> Result<Vec<PersistedRecord>, StoreError>;

    /// Insert `records` as one batch, returning how many were written.
    async fn insert_many(&self, records: Vec<PersistedRecord>) -> Result<usize, StoreError>;

    /// Delete documents whose date resolves to an instant before `cutoff`.
    /// Documents with unparsable dates are kept.
    async fn delete_dated_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;

    async fn delete_all(&self) -> Result<usize, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

/// Source of the run's site configurations.
pub trait ConfigStore {
    /// All site configurations, in load order.
    async fn site_configs(&self) -> Result<Vec<SiteConfig>, StoreError>;
}

/// Whether a stored document is older than `cutoff`.
pub(crate) fn dated_before(record: &PersistedRecord, cutoff: DateTime<Utc>) -> bool {
    record
        .record
        .date
        .resolve()
        .is_some_and(|date| date < cutoff)
}
