//! Command-line interface definitions for News Harvest.
//!
//! All options can be provided via command-line flags or environment
//! variables; a `.env` file in the working directory is read first.

use crate::maintenance::{DEFAULT_MONTHS_TO_KEEP, RestoreMode};
use crate::pipeline::DEFAULT_RETENTION_DAYS;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the News Harvest application.
///
/// # Examples
///
/// ```sh
/// # Daily run: crawl, ingest, prune
/// news_harvest --store-dir ./data --database news --collection articles \
///     run --sites ./sites.yaml
///
/// # Backup and restore
/// news_harvest --store-dir ./data --database news --collection articles backup
/// news_harvest --store-dir ./data --database news --collection articles \
///     restore --mode merge
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Root directory of the document store
    #[arg(long, env = "NEWS_STORE_DIR")]
    pub store_dir: PathBuf,

    /// Database name (a directory under the store root)
    #[arg(long, env = "NEWS_DATABASE")]
    pub database: String,

    /// Collection holding the article documents
    #[arg(long, env = "NEWS_COLLECTION")]
    pub collection: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl every configured site, store new articles, then prune old ones
    Run(RunArgs),

    /// Delete articles older than the retention period
    Cleanup {
        /// Calendar months of articles to keep
        #[arg(long, env = "MONTHS_TO_KEEP", default_value_t = DEFAULT_MONTHS_TO_KEEP)]
        months_to_keep: u32,
    },

    /// Write the whole collection to a JSON backup file
    Backup {
        #[arg(long, env = "BACKUP_FILE", default_value = "./backups/collection-backup.json")]
        backup_file: PathBuf,
    },

    /// Load a JSON backup file into the collection
    Restore {
        #[arg(long, env = "BACKUP_FILE", default_value = "./backups/collection-backup.json")]
        backup_file: PathBuf,

        /// `replace` deletes everything first; `merge` only adds unknown ids
        #[arg(long, env = "RESTORE_MODE", value_enum, default_value = "replace")]
        mode: RestoreMode,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML file listing the site configurations
    #[arg(long, env = "NEWS_SITES_FILE")]
    pub sites: PathBuf,

    /// Articles older than this many days are not stored
    #[arg(long, env = "NEWS_RETENTION_DAYS", default_value_t = DEFAULT_RETENTION_DAYS)]
    pub retention_days: u32,

    /// Calendar months of articles kept by the post-run cleanup
    #[arg(long, env = "MONTHS_TO_KEEP", default_value_t = DEFAULT_MONTHS_TO_KEEP)]
    pub months_to_keep: u32,

    /// Reject articles with any field that failed type coercion
    #[arg(long, env = "NEWS_DROP_INVALID")]
    pub drop_invalid: bool,

    #[arg(long, default_value_t = 1000)]
    pub max_requests_per_crawl: usize,

    #[arg(long, default_value_t = 1)]
    pub max_concurrency: usize,

    #[arg(long, default_value_t = 1)]
    pub max_request_retries: usize,

    /// Minimum spacing between requests to the same host
    #[arg(long, default_value_t = 1)]
    pub same_domain_delay_secs: u64,

    /// Budget for each element-level read while extracting a field
    #[arg(long, default_value_t = 3000)]
    pub field_timeout_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_run_defaults() {
        let cli = Cli::parse_from([
            "news_harvest",
            "--store-dir",
            "./data",
            "--database",
            "news",
            "--collection",
            "articles",
            "run",
            "--sites",
            "./sites.yaml",
        ]);

        assert_eq!(cli.store_dir, PathBuf::from("./data"));
        assert_eq!(cli.database, "news");
        assert_eq!(cli.collection, "articles");
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.sites, PathBuf::from("./sites.yaml"));
        assert_eq!(args.retention_days, 7);
        assert_eq!(args.months_to_keep, 3);
        assert!(!args.drop_invalid);
        assert_eq!(args.max_requests_per_crawl, 1000);
        assert_eq!(args.max_concurrency, 1);
        assert_eq!(args.max_request_retries, 1);
        assert_eq!(args.same_domain_delay_secs, 1);
        assert_eq!(args.field_timeout_ms, 3000);
    }

    #[test]
    fn test_cli_restore_mode() {
        let cli = Cli::parse_from([
            "news_harvest",
            "--store-dir",
            "/tmp/store",
            "--database",
            "news",
            "--collection",
            "articles",
            "restore",
            "--backup-file",
            "/tmp/backup.json",
            "--mode",
            "merge",
        ]);

        let Command::Restore { backup_file, mode } = cli.command else {
            panic!("expected restore subcommand");
        };
        assert_eq!(backup_file, PathBuf::from("/tmp/backup.json"));
        assert_eq!(mode, RestoreMode::Merge);
    }

    #[test]
    fn test_cli_rejects_unknown_restore_mode() {
        let result = Cli::try_parse_from([
            "news_harvest",
            "--store-dir",
            "/tmp/store",
            "--database",
            "news",
            "--collection",
            "articles",
            "restore",
            "--mode",
            "append",
        ]);
        assert!(result.is_err());
    }
}
