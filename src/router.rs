//! Page routing between link discovery and article extraction.
//!
//! Requests enter unlabeled. The discovery handler finds the owning site by
//! substring match on its base URL, then returns the page's links that match
//! the site's globs, labeled with the site name. A labeled request is an
//! article page: its record is built and appended to the run's
//! [`ResultBuffer`]. Article pages never enqueue further links.
//!
//! Site identification is an ordered linear scan where the first site whose
//! base URL is contained in the page URL wins. A base URL that is a substring
//! of another site's URL can shadow it, so configuration order matters.

use crate::errors::{ConfigError, RouteError};
use crate::extract::RecordBuilder;
use crate::models::{ArticleRecord, SiteConfig};
use crate::page::RenderedPage;
use globset::{GlobBuilder, GlobMatcher};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// A URL to crawl, optionally tagged with the label of the handler for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub url: String,
    pub label: Option<String>,
}

impl CrawlRequest {
    pub fn unlabeled(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: None,
        }
    }

    pub fn labeled(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: Some(label.into()),
        }
    }
}

/// Records extracted during one run, shared by all crawl workers.
#[derive(Debug, Clone, Default)]
pub struct ResultBuffer {
    records: Arc<Mutex<Vec<ArticleRecord>>>,
}

impl ResultBuffer {
    pub async fn push(&self, record: ArticleRecord) {
        self.records.lock().await.push(record);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Take everything buffered so far, leaving the buffer empty.
    pub async fn take(&self) -> Vec<ArticleRecord> {
        std::mem::take(&mut *self.records.lock().await)
    }
}

/// A site with its compiled link-discovery globs.
#[derive(Debug)]
struct SiteRoute {
    config: SiteConfig,
    patterns: Vec<GlobMatcher>,
}

impl SiteRoute {
    fn matches(&self, url: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(url))
    }
}

/// Compile a link glob. `*` stays within one path segment, `**` crosses
/// segments and `{a,b}` alternates.
fn compile_glob(glob: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(glob)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

#[derive(Debug)]
pub struct Router {
    sites: Vec<SiteRoute>,
    by_label: HashMap<String, usize>,
    builder: RecordBuilder,
    buffer: ResultBuffer,
}

impl Router {
    /// Build a router over `sites`, preserving their order.
    ///
    /// # Errors
    ///
    /// Fails on an unparsable glob or on two sites sharing a name.
    pub fn new(
        sites: Vec<SiteConfig>,
        builder: RecordBuilder,
        buffer: ResultBuffer,
    ) -> Result<Self, ConfigError> {
        let mut routes = Vec::with_capacity(sites.len());
        let mut by_label = HashMap::with_capacity(sites.len());

        for (index, config) in sites.into_iter().enumerate() {
            if by_label.insert(config.name.clone(), index).is_some() {
                return Err(ConfigError::DuplicateSite(config.name));
            }
            let patterns = config
                .globs
                .iter()
                .map(|glob| {
                    compile_glob(glob).map_err(|source| ConfigError::InvalidGlob {
                        site: config.name.clone(),
                        glob: glob.clone(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            routes.push(SiteRoute { config, patterns });
        }

        Ok(Self {
            sites: routes,
            by_label,
            builder,
            buffer,
        })
    }

    /// The crawl's start requests: every site's base URL, unlabeled, in order.
    ///
    /// A base URL without a scheme is requested over https.
    pub fn start_requests(&self) -> Vec<CrawlRequest> {
        self.sites
            .iter()
            .map(|route| {
                let base = route.config.url.as_str();
                if base.starts_with("http://") || base.starts_with("https://") {
                    CrawlRequest::unlabeled(base)
                } else {
                    CrawlRequest::unlabeled(format!("https://{base}"))
                }
            })
            .collect()
    }

    /// First site whose base URL occurs in `url`.
    #[cfg(test)]
    pub fn site_for(&self, url: &str) -> Option<&SiteConfig> {
        self.route_for(url).map(|route| &route.config)
    }

    fn route_for(&self, url: &str) -> Option<&SiteRoute> {
        self.sites
            .iter()
            .find(|route| url.contains(route.config.url.as_str()))
    }

    /// Handle one fetched page, returning the requests it enqueues.
    ///
    /// # Arguments
    ///
    /// * `request` - The request the page was fetched for; its label picks the handler
    /// * `page` - The rendered page
    ///
    /// # Returns
    ///
    /// Labeled article requests for a listing page; nothing for an article
    /// page or a page no site owns.
    ///
    /// # Errors
    ///
    /// [`RouteError`] when extraction or link discovery fails, or the label is
    /// unknown. The crawl engine decides whether to retry.
    #[instrument(level = "debug", skip_all, fields(url = %request.url, label = ?request.label))]
    pub async fn handle<P: RenderedPage>(
        &self,
        request: &CrawlRequest,
        page: &P,
    ) -> Result<Vec<CrawlRequest>, RouteError> {
        match &request.label {
            None => self.discover(page).await,
            Some(label) => {
                self.extract(label, page).await?;
                Ok(Vec::new())
            }
        }
    }

    async fn discover<P: RenderedPage>(&self, page: &P) -> Result<Vec<CrawlRequest>, RouteError> {
        let url = page.url();
        let Some(route) = self.route_for(url) else {
            info!(%url, "No site configuration matches page; skipping");
            return Ok(Vec::new());
        };

        let links = page.links().await.map_err(|source| RouteError::Discover {
            url: url.to_string(),
            source,
        })?;
        let mut enqueued: Vec<CrawlRequest> = Vec::new();
        for link in links {
            if route.matches(&link) && !enqueued.iter().any(|r| r.url == link) {
                enqueued.push(CrawlRequest::labeled(link, route.config.name.clone()));
            }
        }

        info!(site = %route.config.name, count = enqueued.len(), "Enqueueing article links");
        Ok(enqueued)
    }

    async fn extract<P: RenderedPage>(&self, label: &str, page: &P) -> Result<(), RouteError> {
        let index = *self
            .by_label
            .get(label)
            .ok_or_else(|| RouteError::UnknownLabel(label.to_string()))?;
        let site = &self.sites[index].config;

        let record = self
            .builder
            .build(site, page)
            .await
            .map_err(|source| RouteError::Extract {
                url: page.url().to_string(),
                source,
            })?;

        debug!(site = %site.name, headline = %record.headline, "Extracted article");
        self.buffer.push(record).await;
        Ok(())
    }
}
