//! Crawl orchestration
//!
//! The [`Crawler`] wires the three workers together, submits the seed,
//! waits until no work is left anywhere in the pipeline and hands back the
//! graph the tracker built:
//!
//! ```text
//!            requests             fetch messages           parse messages
//! seed --> [ Fetcher ] ---------> [ Parser ] -----------> [ Tracker ] --+
//!              ^                                                        |
//!              +------------------- new URLs (detached tasks) ----------+
//! ```

use crate::config::Config;
use crate::crawler::counters::CrawlCounters;
use crate::crawler::fetcher::{FetchStage, Fetcher};
use crate::crawler::http::{HttpClient, ReqwestClient};
use crate::crawler::parser::ParseStage;
use crate::crawler::pending::Pending;
use crate::crawler::tracker::TrackStage;
use crate::crawler::worker::{Stage, Worker, WorkerKind, WorkerState};
use crate::dedup::BloomFilter;
use crate::graph::SiteGraph;
use crate::output::CrawlStats;
use crate::url::{ensure_http_scheme, normalize_url};
use crate::CrawlError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

/// Tuning knobs for one crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlerSettings {
    /// Buffer size of each inter-worker channel
    pub channel_capacity: usize,

    /// Upper bound on the whole crawl; `None` waits indefinitely
    pub crawl_timeout: Option<Duration>,

    /// Number of URLs the dedup filter is sized for
    pub expected_urls: usize,

    /// Target false-positive rate of the dedup filter
    pub false_positive_rate: f64,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 1,
            crawl_timeout: None,
            expected_urls: 20_000,
            false_positive_rate: 0.01,
        }
    }
}

impl CrawlerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            channel_capacity: config.crawler.channel_capacity,
            crawl_timeout: config.crawler.crawl_timeout_secs.map(Duration::from_secs),
            expected_urls: config.dedup.expected_urls,
            false_positive_rate: config.dedup.false_positive_rate,
        }
    }
}

/// Outcome of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub graph: SiteGraph,
    pub stats: CrawlStats,
}

/// Single-domain crawler
///
/// The workers are created with the crawler and stop for good when a crawl
/// ends, so each `Crawler` runs one crawl. Starting a second one fails with
/// [`CrawlError::AlreadyStopped`].
pub struct Crawler<C> {
    client: C,
    settings: CrawlerSettings,
    fetcher: Arc<Worker>,
    parser: Arc<Worker>,
    tracker: Arc<Worker>,
}

impl<C: HttpClient + Clone> Crawler<C> {
    /// Creates a crawler with all three workers waiting
    pub fn new(client: C, settings: CrawlerSettings) -> Self {
        Self {
            client,
            settings,
            fetcher: Self::new_worker(WorkerKind::Fetcher),
            parser: Self::new_worker(WorkerKind::Parser),
            tracker: Self::new_worker(WorkerKind::Tracker),
        }
    }

    fn new_worker(kind: WorkerKind) -> Arc<Worker> {
        let span = tracing::info_span!("worker", kind = %kind);
        Arc::new(Worker::new(kind, span))
    }

    pub fn settings(&self) -> &CrawlerSettings {
        &self.settings
    }

    /// Current state of each worker, in pipeline order
    pub fn worker_states(&self) -> [(WorkerKind, WorkerState); 3] {
        [
            (self.fetcher.kind(), self.fetcher.state()),
            (self.parser.kind(), self.parser.state()),
            (self.tracker.kind(), self.tracker.state()),
        ]
    }

    /// Sum of the numeric worker states
    ///
    /// Zero exactly when all three workers are waiting. Only a diagnostic:
    /// an idle pipeline can still have messages queued between workers.
    pub fn worker_state_sum(&self) -> u8 {
        self.worker_states()
            .iter()
            .map(|(_, state)| state.as_u8())
            .sum()
    }

    /// Crawls from `seed` and returns the site graph
    ///
    /// See [`run`](Self::run) for the error cases.
    pub async fn crawl(&self, seed: &Url) -> Result<SiteGraph, CrawlError> {
        self.run(seed).await.map(|report| report.graph)
    }

    /// Crawls from `seed` until the pipeline is quiet
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The graph rooted at the normalized seed, with run statistics
    /// * `Err(CrawlError::InvalidScheme)` - The seed is not `http`/`https`
    /// * `Err(CrawlError::SeedFetch)` - The seed itself could not be fetched
    /// * `Err(CrawlError::Timeout)` - The configured crawl timeout elapsed
    /// * `Err(CrawlError::AlreadyStopped)` - This crawler already ran
    pub async fn run(&self, seed: &Url) -> Result<CrawlReport, CrawlError> {
        ensure_http_scheme(seed)?;
        let seed = normalize_url(seed.as_str())?;
        let started_at = Utc::now();

        let pending = Pending::new();
        let counters = Arc::new(CrawlCounters::new());
        let capacity = self.settings.channel_capacity.max(1);

        let (request_tx, request_rx) = mpsc::channel(capacity);
        let (fetched_tx, fetched_rx) = mpsc::channel(capacity);
        let (links_tx, links_rx) = mpsc::channel(capacity);

        let fetcher = Fetcher::new(self.fetcher.clone(), request_tx, pending.clone());
        let fetch_stage = FetchStage::new(self.client.clone(), fetched_tx, counters.clone());
        let parse_stage = ParseStage::new(
            self.parser.clone(),
            seed.clone(),
            links_tx,
            pending.clone(),
            counters.clone(),
        );
        let track_stage = TrackStage::new(
            fetcher.clone(),
            BloomFilter::with_rate(self.settings.expected_urls, self.settings.false_positive_rate),
            SiteGraph::with_root(seed.as_str()),
            pending.clone(),
            counters.clone(),
        );

        let fetch_task = spawn_worker(&self.fetcher, fetch_stage, request_rx);
        let parse_task = spawn_worker(&self.parser, parse_stage, fetched_rx);
        let track_task = spawn_worker(&self.tracker, track_stage, links_rx);

        tracing::info!("Starting crawl of {}", seed);
        let submitted = fetcher.fetch(seed.clone()).await;
        drop(fetcher);

        let waited = match &submitted {
            Ok(()) => self.wait_for_quiescence(&pending).await,
            Err(_) => Ok(()),
        };

        self.stop_all();
        let fetched = join_worker(WorkerKind::Fetcher, fetch_task).await;
        let parsed = join_worker(WorkerKind::Parser, parse_task).await;
        let tracked = join_worker(WorkerKind::Tracker, track_task).await;

        submitted?;
        parsed?;
        waited?;
        fetched?;
        let graph = tracked?.into_graph();

        let stats = counters.snapshot(started_at, Utc::now());
        tracing::info!(
            "Crawl of {} finished: {} pages, {} links, {} fetch failures",
            seed,
            graph.node_count(),
            graph.edge_count(),
            stats.fetch_failures
        );

        Ok(CrawlReport { graph, stats })
    }

    async fn wait_for_quiescence(&self, pending: &Pending) -> Result<(), CrawlError> {
        match self.settings.crawl_timeout {
            Some(limit) => tokio::time::timeout(limit, pending.wait_idle())
                .await
                .map_err(|_| {
                    tracing::warn!(
                        "Crawl timed out with {} units of work outstanding",
                        pending.outstanding()
                    );
                    CrawlError::Timeout { limit }
                }),
            None => {
                pending.wait_idle().await;
                Ok(())
            }
        }
    }

    fn stop_all(&self) {
        tracing::debug!("stopping workers");
        self.fetcher.request_stop();
        self.parser.request_stop();
        self.tracker.request_stop();
    }
}

fn spawn_worker<S: Stage>(
    worker: &Arc<Worker>,
    stage: S,
    inbox: mpsc::Receiver<S::Input>,
) -> JoinHandle<Result<S, CrawlError>> {
    let worker = Arc::clone(worker);
    tokio::spawn(async move { worker.run(stage, inbox).await })
}

async fn join_worker<S>(
    kind: WorkerKind,
    handle: JoinHandle<Result<S, CrawlError>>,
) -> Result<S, CrawlError> {
    match handle.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("{} task failed: {}", kind, e);
            Err(CrawlError::WorkerPanicked { worker: kind })
        }
    }
}

/// Crawls `seed` with a reqwest-backed client built from `config`
///
/// # Example
///
/// ```no_run
/// use sitemap_crawler::{crawl, Config};
/// use url::Url;
///
/// # async fn example() -> sitemap_crawler::Result<()> {
/// let seed = Url::parse("http://example.com/").unwrap();
/// let report = crawl(&seed, &Config::default()).await?;
/// println!("{} pages", report.graph.node_count());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(seed: &Url, config: &Config) -> Result<CrawlReport, CrawlError> {
    let client = ReqwestClient::from_config(
        &config.user_agent,
        Duration::from_secs(config.crawler.request_timeout_secs),
    )?;
    Crawler::new(client, CrawlerSettings::from_config(config))
        .run(seed)
        .await
}
