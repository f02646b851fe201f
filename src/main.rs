//! # News Harvest
//!
//! A schema-driven news article harvester. Each configured site declares a
//! base URL, the link globs that identify its article pages, and CSS selectors
//! for the article fields. A run crawls every site, extracts one record per
//! article page, keeps only fresh and previously unseen articles, stores them
//! with a fresh identifier and prunes entries past the retention period.
//!
//! ## Usage
//!
//! ```sh
//! news_harvest --store-dir ./data --database news --collection articles \
//!     run --sites ./sites.yaml
//! ```
//!
//! ## Architecture
//!
//! 1. **Routing**: start pages are scanned for links matching the owning
//!    site's globs; matches are enqueued labeled with the site name
//! 2. **Extraction**: labeled pages are turned into records by the site's
//!    field schema, with per-field type coercion
//! 3. **Ingestion**: freshness filter, intra-batch and cross-store dedup,
//!    identifier assignment, one batch insert
//! 4. **Maintenance**: age-based cleanup, JSON backup and restore

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod crawler;
mod errors;
mod extract;
mod harvest;
mod maintenance;
mod models;
mod notify;
mod page;
mod pipeline;
mod router;
mod store;
#[cfg(test)]
mod testing;
mod utils;

use cli::{Cli, Command, RunArgs};
use crawler::CrawlerOptions;
use harvest::{HarvestOptions, run_and_notify};
use maintenance::{backup_collection, cleanup_old_entries, restore_collection};
use notify::LogNotifier;
use pipeline::{FreshnessFilter, IngestOptions};
use store::{JsonFileStore, YamlConfigStore};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_harvest starting up");

    let args = Cli::parse();
    debug!(?args.store_dir, %args.database, %args.collection, "Parsed CLI arguments");

    let store = match JsonFileStore::open(&args.store_dir, &args.database, &args.collection).await
    {
        Ok(store) => store,
        Err(e) => {
            error!(
                path = %args.store_dir.display(),
                error = %e,
                "Record store is not usable (fix perms or choose a different path)"
            );
            return Err(e.into());
        }
    };

    match args.command {
        Command::Run(run) => {
            let configs = YamlConfigStore::new(&run.sites);
            let options = harvest_options(&run);
            run_and_notify(&configs, &store, &options, &LogNotifier).await?;
        }
        Command::Cleanup { months_to_keep } => {
            cleanup_old_entries(&store, months_to_keep, chrono::Utc::now()).await?;
        }
        Command::Backup { backup_file } => {
            info!(from = %store.path().display(), "Backing up collection");
            backup_collection(&store, &args.database, &args.collection, &backup_file).await?;
        }
        Command::Restore { backup_file, mode } => {
            info!(into = %store.path().display(), ?mode, "Restoring collection");
            restore_collection(&store, &backup_file, mode).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

fn harvest_options(run: &RunArgs) -> HarvestOptions {
    HarvestOptions {
        crawler: CrawlerOptions {
            max_requests_per_crawl: run.max_requests_per_crawl,
            max_concurrency: run.max_concurrency,
            max_request_retries: run.max_request_retries,
            same_domain_delay: Duration::from_secs(run.same_domain_delay_secs),
            ..Default::default()
        },
        field_timeout: Duration::from_millis(run.field_timeout_ms),
        ingest: IngestOptions {
            freshness: FreshnessFilter::new(run.retention_days),
            drop_invalid_records: run.drop_invalid,
        },
        months_to_keep: run.months_to_keep,
    }
}
