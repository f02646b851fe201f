//! One full harvest run: crawl every configured site, ingest what was
//! extracted, then prune old entries.
//!
//! Configuration problems abort before any request is made. A page that
//! fails only costs its own record. Store failures end the run with an error.

use crate::crawler::{CrawlStats, Crawler, CrawlerOptions};
use crate::errors::HarvestError;
use crate::extract::{DEFAULT_FIELD_TIMEOUT, FieldExtractor, RecordBuilder};
use crate::maintenance::{DEFAULT_MONTHS_TO_KEEP, cleanup_old_entries};
use crate::notify::Notifier;
use crate::pipeline::{IngestOptions, IngestReport, IngestionPipeline};
use crate::router::{ResultBuffer, Router};
use crate::store::{ConfigStore, RecordStore};
use chrono::Utc;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub crawler: CrawlerOptions,
    pub field_timeout: Duration,
    pub ingest: IngestOptions,
    pub months_to_keep: u32,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            crawler: CrawlerOptions::default(),
            field_timeout: DEFAULT_FIELD_TIMEOUT,
            ingest: IngestOptions::default(),
            months_to_keep: DEFAULT_MONTHS_TO_KEEP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HarvestSummary {
    pub sites: usize,
    pub crawl: CrawlStats,
    pub ingest: IngestReport,
    /// Entries removed by the post-ingest cleanup.
    pub cleaned: usize,
    pub elapsed_secs: u64,
}

impl HarvestSummary {
    /// Human-readable multi-line summary for the notification sink.
    pub fn to_message(&self) -> String {
        format!(
            "Sites crawled: {}\n\
             Pages handled: {} ({} failed, {} article links enqueued)\n\
             Articles extracted: {}\n\
             Fresh articles considered: {}\n\
             Articles already stored: {}\n\
             New articles inserted: {}\n\
             Old entries removed: {}\n\
             Elapsed: {}s",
            self.sites,
            self.crawl.handled,
            self.crawl.failed,
            self.crawl.enqueued,
            self.ingest.buffered,
            self.ingest.considered,
            self.ingest.existing,
            self.ingest.inserted,
            self.cleaned,
            self.elapsed_secs,
        )
    }
}

/// Crawl, ingest and clean up once.
///
/// # Arguments
///
/// * `configs` - Source of the site configurations, read once
/// * `store` - Record store for ingestion and cleanup
/// * `options` - Crawl engine, extraction, ingestion and retention settings
///
/// # Returns
///
/// Crawl statistics, the ingestion report and the cleanup count.
///
/// # Errors
///
/// - [`HarvestError::NoSiteConfigs`] when the configuration store is empty
/// - [`HarvestError::Config`] for an unusable site configuration
/// - store failures while loading configs, ingesting or cleaning up
#[instrument(level = "info", skip_all)]
pub async fn run_harvest<C: ConfigStore, S: RecordStore>(
    configs: &C,
    store: &S,
    options: &HarvestOptions,
) -> Result<HarvestSummary, HarvestError> {
    let start_time = Instant::now();

    let sites = configs.site_configs().await?;
    if sites.is_empty() {
        return Err(HarvestError::NoSiteConfigs);
    }
    let site_count = sites.len();
    info!(sites = site_count, "Loaded site configurations");

    let buffer = ResultBuffer::default();
    let builder = RecordBuilder::new(FieldExtractor::new(options.field_timeout));
    let router = Router::new(sites, builder, buffer.clone())?;
    let crawler = Crawler::new(options.crawler.clone()).map_err(HarvestError::CrawlerSetup)?;

    let crawl = crawler.run(router.start_requests(), &router).await;
    let records = buffer.take().await;
    info!(count = records.len(), "Crawl produced records");

    let ingest = IngestionPipeline::new(store, options.ingest)
        .ingest(records)
        .await?;
    let cleaned = cleanup_old_entries(store, options.months_to_keep, Utc::now()).await?;

    let summary = HarvestSummary {
        sites: site_count,
        crawl,
        ingest,
        cleaned,
        elapsed_secs: start_time.elapsed().as_secs(),
    };
    info!(
        inserted = summary.ingest.inserted,
        cleaned = summary.cleaned,
        secs = summary.elapsed_secs,
        "Harvest complete"
    );
    Ok(summary)
}

/// [`run_harvest`], reporting the outcome to `notifier` either way.
pub async fn run_and_notify<C, S, N>(
    configs: &C,
    store: &S,
    options: &HarvestOptions,
    notifier: &N,
) -> Result<HarvestSummary, HarvestError>
where
    C: ConfigStore,
    S: RecordStore,
    N: Notifier,
{
    match run_harvest(configs, store, options).await {
        Ok(summary) => {
            notifier
                .notify("News harvest succeeded", &summary.to_message())
                .await;
            Ok(summary)
        }
        Err(e) => {
            error!(error = %e, "Harvest failed");
            notifier
                .notify("News harvest failed", &format!("Reason: {e}"))
                .await;
            Err(e)
        }
    }
}
