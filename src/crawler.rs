//! Worker orchestration: the fetch → classify → persist → extract → enqueue
//! pipeline and the termination protocol.
//!
//! N workers share one [`FrontierSet`]. A worker that finds the queue empty
//! may not exit on its own: another worker still processing a page could
//! offer new links. The frontier's claim/release bookkeeping makes the
//! empty-and-nobody-busy check atomic, and the first worker to observe it
//! flips a stop flag every other worker consults at the top of its loop.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use crate::config::CrawlConfig;
use crate::frontier::{Claim, FrontierSet};
use crate::network::{FetchError, Fetcher, HttpFetcher};
use crate::parser::{HrefExtractor, LinkExtractor};
use crate::store::{Store, StoreError};
use crate::url_utils;

/// Final counts reported after the crawl reaches quiescence or its limit.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub pages_downloaded: i64,
    pub urls_visited: usize,
    pub elapsed: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

struct Shared {
    config: CrawlConfig,
    frontier: FrontierSet,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    store: Store,
    pages_downloaded: AtomicI64,
    stop: AtomicBool,
}

pub struct Crawler {
    shared: Arc<Shared>,
}

impl Crawler {
    /// Build a crawler over explicit capabilities. Creates the output tree
    /// and the ledger immediately.
    pub fn new(
        config: CrawlConfig,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Result<Self, CrawlError> {
        let store = Store::open(&config.raw_output)?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                frontier: FrontierSet::new(),
                fetcher,
                extractor,
                store,
                pages_downloaded: AtomicI64::new(0),
                stop: AtomicBool::new(false),
            }),
        })
    }

    /// Build a crawler with the real HTTP transport and href extractor.
    pub fn with_http(config: CrawlConfig) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::new(config.timeout_seconds)?;
        Self::new(config, Arc::new(fetcher), Arc::new(HrefExtractor))
    }

    /// Seed the frontier and run workers until quiescence or the page limit.
    pub async fn run(&self) -> CrawlSummary {
        let started = Instant::now();

        if !self.shared.seed() {
            tracing::warn!(
                url = %self.shared.config.start_url,
                "start URL rejected, crawl will terminate immediately"
            );
        }

        let worker_count = self.shared.config.threads.max(1);
        tracing::info!(
            start_url = %self.shared.config.start_url,
            workers = worker_count,
            "crawl started"
        );

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let shared = Arc::clone(&self.shared);
            workers.spawn(async move { worker_loop(worker_id, shared).await });
        }
        while workers.join_next().await.is_some() {}

        let summary = CrawlSummary {
            pages_downloaded: self.shared.pages_downloaded.load(Ordering::SeqCst),
            urls_visited: self.shared.frontier.visited_count(),
            elapsed: started.elapsed(),
        };
        tracing::info!(
            pages = summary.pages_downloaded,
            visited = summary.urls_visited,
            elapsed_secs = summary.elapsed.as_secs(),
            "crawl finished"
        );
        summary
    }
}

async fn worker_loop(worker_id: usize, shared: Arc<Shared>) {
    loop {
        if shared.stop.load(Ordering::SeqCst) {
            break;
        }
        match shared.frontier.try_claim() {
            Claim::Url(url) => {
                let keep_running = shared.process_url(&url).await;
                // Links extracted from this page are already offered; only
                // now may the worker stop counting as busy.
                shared.frontier.release();
                if !keep_running {
                    shared.signal_stop();
                    break;
                }
            }
            Claim::Quiescent => {
                tracing::debug!(worker_id, "frontier drained");
                shared.signal_stop();
                break;
            }
            Claim::Idle => shared.frontier.wait_for_work().await,
        }
    }
}

impl Shared {
    /// Enter the start URL, subject to the domain filter only: a seed with a
    /// gated extension is still crawled.
    fn seed(&self) -> bool {
        let url = url_utils::strip_fragment(&self.config.start_url);
        if url.is_empty() || !self.is_allowed_domain(url) {
            return false;
        }
        self.frontier.offer(url)
    }

    fn signal_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.frontier.wake_all();
    }

    fn limit_reached(&self) -> bool {
        self.config.max_pages >= 0
            && self.pages_downloaded.load(Ordering::SeqCst) >= self.config.max_pages
    }

    /// Process one claimed URL. Returns false when the crawl should stop.
    async fn process_url(&self, url: &str) -> bool {
        if self.limit_reached() {
            return false;
        }

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(url, error = %e, "fetch failed");
                return true;
            }
        };

        let artifact = match self.store.persist(url, &page.body, &page.content_type) {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::error!(url, error = %e, "failed to persist artifact");
                return true;
            }
        };

        let downloaded = self.pages_downloaded.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(
            url,
            path = %artifact.path.display(),
            downloaded,
            "stored artifact"
        );

        if artifact.is_html {
            for link in self.extractor.extract(&page.body, url) {
                if self.should_enqueue(&link) {
                    self.frontier.offer(&link);
                }
            }
        }

        if self.config.request_delay_seconds > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(self.config.request_delay_seconds)).await;
        }

        if self.config.max_pages >= 0 && downloaded >= self.config.max_pages {
            return false;
        }
        true
    }

    /// Domain and extension gate for discovered links.
    fn should_enqueue(&self, url: &str) -> bool {
        let normalized = url_utils::strip_fragment(url);
        if normalized.is_empty() {
            return false;
        }
        let Some(parts) = url_utils::parse(normalized) else {
            return false;
        };
        if !self.config.allowed_domains.contains(&parts.host) {
            return false;
        }
        let extension = url_utils::extension_of(normalized);
        if !extension.is_empty() && !self.config.allowed_extensions.contains(&extension) {
            return false;
        }
        // Extension-less URLs are treated as HTML pages and accepted even
        // when the query carries a download marker.
        true
    }

    fn is_allowed_domain(&self, url: &str) -> bool {
        match url_utils::parse(url) {
            Some(parts) => self.config.allowed_domains.contains(&parts.host),
            None => false,
        }
    }
}
