//! Typed errors for extraction, routing, storage and the harvest run.
//!
//! Library-level code returns these; only `main` collapses them into
//! `Box<dyn Error>`.

use thiserror::Error;

/// Failures raised by a rendered-document accessor.
#[derive(Debug, Error)]
pub enum PageError {
    /// The locator could not be parsed.
    #[error("invalid locator `{locator}`: {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// The backing document could not be read.
    #[error("page unavailable: {0}")]
    Unavailable(String),
}

/// Failures while turning a page into field values.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// An element-level read did not finish within the field timeout.
    #[error("timed out after {timeout_ms} ms resolving `{locator}`")]
    Timeout { locator: String, timeout_ms: u64 },

    #[error(transparent)]
    Page(#[from] PageError),

    #[error("field `{field}`: {source}")]
    Coerce {
        field: &'static str,
        #[source]
        source: CoerceError,
    },
}

/// Raw string could not be coerced into its declared structured type.
#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("malformed structured value: {0}")]
    Structured(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RouteError {
    /// A labeled request arrived for a label no site owns.
    #[error("no handler registered for label `{0}`")]
    UnknownLabel(String),

    #[error("extraction failed for {url}: {source}")]
    Extract {
        url: String,
        #[source]
        source: ExtractError,
    },

    #[error("link discovery failed for {url}: {source}")]
    Discover {
        url: String,
        #[source]
        source: PageError,
    },
}

/// Failures of one crawl request attempt.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Record or configuration store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable at {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("site configuration is malformed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Site configuration that loaded but cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("site `{site}` has invalid glob `{glob}`: {source}")]
    InvalidGlob {
        site: String,
        glob: String,
        #[source]
        source: globset::Error,
    },

    #[error("duplicate site name `{0}`")]
    DuplicateSite(String),
}

/// Fatal outcomes of a full harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("no site configurations found; add sites to the configuration store")]
    NoSiteConfigs,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("crawler setup failed: {0}")]
    CrawlerSetup(#[source] CrawlError),

    #[error("failed to read existing records: {0}")]
    ReadExisting(#[source] StoreError),

    #[error("failed to insert records: {0}")]
    Insert(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
