//! A small crawl engine driving the [`Router`].
//!
//! The engine owns queueing, concurrency, per-domain pacing and retries;
//! the router only decides what a page means.
//!
//! # Scheduling
//!
//! - Requests are deduplicated by URL and served FIFO.
//! - At most `max_concurrency` requests are in flight; each runs its handler
//!   to completion before its slot is reused.
//! - Requests to the same host are spaced by `same_domain_delay`.
//! - A failed attempt (fetch or handler) is retried up to
//!   `max_request_retries` times with exponential backoff and jitter. A
//!   request that never succeeds is logged and dropped; the crawl goes on.
//! - At most `max_requests_per_crawl` requests are handled.

use crate::errors::CrawlError;
use crate::page::HtmlPage;
use crate::router::{CrawlRequest, Router};
use futures::stream::{FuturesUnordered, StreamExt};
use rand::{Rng, rng};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Crawl engine settings.
#[derive(Debug, Clone)]
pub struct CrawlerOptions {
    pub max_requests_per_crawl: usize,
    pub max_concurrency: usize,
    pub max_request_retries: usize,
    pub same_domain_delay: Duration,
    pub request_timeout: Duration,
    /// First retry delay; doubles per attempt.
    pub retry_base_delay: Duration,
}

impl Default for CrawlerOptions {
    fn default() -> Self {
        Self {
            max_requests_per_crawl: 1000,
            max_concurrency: 1,
            max_request_retries: 1,
            same_domain_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

/// Totals for one crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Requests whose handler completed.
    pub handled: usize,
    /// Requests dropped after exhausting their retries.
    pub failed: usize,
    /// Requests added by handlers (after URL dedup).
    pub enqueued: usize,
}

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt` (1-based), without jitter.
fn backoff_delay(base: Duration, attempt: usize) -> Duration {
    let shift = (attempt.saturating_sub(1)).min(16) as u32;
    base.saturating_mul(1 << shift).min(MAX_RETRY_DELAY)
}

/// Per-host request spacing.
#[derive(Debug)]
struct Politeness {
    delay: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl Politeness {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve the next slot for `url`'s host and wait until it opens.
    async fn wait_turn(&self, url: &str) {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        let wait = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = slots
                .get(&host)
                .copied()
                .filter(|slot| *slot > now)
                .unwrap_or(now);
            slots.insert(host, slot + self.delay);
            slot - now
        };

        if !wait.is_zero() {
            debug!(?wait, %url, "Waiting for same-domain delay");
            sleep(wait).await;
        }
    }
}

pub struct Crawler {
    client: reqwest::Client,
    options: CrawlerOptions,
    politeness: Politeness,
}

impl Crawler {
    pub fn new(options: CrawlerOptions) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(options.request_timeout)
            .build()?;
        Ok(Self {
            client,
            politeness: Politeness::new(options.same_domain_delay),
            options,
        })
    }

    /// Crawl from `start` until the queue drains or the request cap is hit.
    #[instrument(level = "info", skip_all, fields(start = start.len()))]
    pub async fn run(&self, start: Vec<CrawlRequest>, router: &Router) -> CrawlStats {
        let mut queue: VecDeque<CrawlRequest> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();
        for request in start {
            if seen.insert(request.url.clone()) {
                queue.push_back(request);
            }
        }

        let mut stats = CrawlStats::default();
        let mut dispatched = 0usize;
        let mut in_flight = FuturesUnordered::new();
        let concurrency = self.options.max_concurrency.max(1);

        loop {
            while in_flight.len() < concurrency && dispatched < self.options.max_requests_per_crawl {
                let Some(request) = queue.pop_front() else {
                    break;
                };
                dispatched += 1;
                in_flight.push(self.process(request, router));
            }

            let Some((request, result)) = in_flight.next().await else {
                break;
            };

            match result {
                Ok(enqueued) => {
                    stats.handled += 1;
                    for next in enqueued {
                        if seen.insert(next.url.clone()) {
                            stats.enqueued += 1;
                            queue.push_back(next);
                        }
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(url = %request.url, label = ?request.label, error = %e, "Request failed; giving up");
                }
            }
        }

        if !queue.is_empty() {
            warn!(
                remaining = queue.len(),
                max = self.options.max_requests_per_crawl,
                "Request cap reached; remaining requests not crawled"
            );
        }
        info!(handled = stats.handled, failed = stats.failed, enqueued = stats.enqueued, "Crawl finished");
        stats
    }

    /// Handle one request with retries.
    async fn process(
        &self,
        request: CrawlRequest,
        router: &Router,
    ) -> (CrawlRequest, Result<Vec<CrawlRequest>, CrawlError>) {
        let mut attempt = 0usize;
        loop {
            match self.attempt(&request, router).await {
                Ok(enqueued) => return (request, Ok(enqueued)),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.options.max_request_retries {
                        return (request, Err(e));
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = backoff_delay(self.options.retry_base_delay, attempt)
                        + Duration::from_millis(jitter_ms);
                    warn!(
                        url = %request.url,
                        attempt,
                        max = self.options.max_request_retries,
                        ?delay,
                        error = %e,
                        "Request attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &CrawlRequest,
        router: &Router,
    ) -> Result<Vec<CrawlRequest>, CrawlError> {
        let page = self.fetch(&request.url).await?;
        Ok(router.handle(request, &page).await?)
    }

    async fn fetch(&self, url: &str) -> Result<HtmlPage, CrawlError> {
        self.politeness.wait_turn(url).await;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status,
            });
        }
        let final_url = response.url().to_string();
        let body = response.text().await?;
        debug!(%url, %final_url, bytes = body.len(), "Fetched page");
        Ok(HtmlPage::new(final_url, &body))
    }
}
