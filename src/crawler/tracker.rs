//! Track stage: deduplicates discovered links and grows the site graph
//!
//! The tracker is the only owner of the Bloom filter and the graph, so
//! neither needs a lock. New URLs are handed back to the fetcher from
//! detached tasks so the tracker never blocks on a busy fetcher.

use crate::crawler::counters::CrawlCounters;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::ParseMessage;
use crate::crawler::pending::Pending;
use crate::crawler::worker::Stage;
use crate::dedup::BloomFilter;
use crate::graph::SiteGraph;
use crate::url::normalize_url;
use crate::CrawlError;
use std::sync::Arc;
use tracing::Instrument;

/// Run-loop side of the tracker
pub struct TrackStage {
    fetcher: Fetcher,
    filter: BloomFilter,
    graph: SiteGraph,
    pending: Pending,
    counters: Arc<CrawlCounters>,
}

impl TrackStage {
    /// Creates a tracker
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Where newly discovered URLs are submitted
    /// * `filter` - Empty dedup filter for this crawl
    /// * `graph` - Graph whose root is the seed
    /// * `pending` - In-flight counter shared with the other stages
    /// * `counters` - Crawl statistics
    pub fn new(
        fetcher: Fetcher,
        filter: BloomFilter,
        graph: SiteGraph,
        pending: Pending,
        counters: Arc<CrawlCounters>,
    ) -> Self {
        Self {
            fetcher,
            filter,
            graph,
            pending,
            counters,
        }
    }

    pub fn graph(&self) -> &SiteGraph {
        &self.graph
    }

    pub fn filter(&self) -> &BloomFilter {
        &self.filter
    }

    /// Consumes the stage, keeping only the graph
    pub fn into_graph(self) -> SiteGraph {
        self.graph
    }

    fn is_root(&self, url: &str) -> bool {
        self.graph.root() == Some(url)
    }
}

impl Stage for TrackStage {
    type Input = ParseMessage;

    async fn handle(&mut self, message: ParseMessage) -> Result<(), CrawlError> {
        let ParseMessage {
            request,
            discovered,
            ticket,
        } = message;

        let discovered = match normalize_url(discovered.as_str()) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("dropping link {} found on {}: {}", discovered, request, e);
                return Ok(());
            }
        };

        if self.filter.check_and_insert(discovered.as_str()) {
            self.counters.record_duplicate();
            tracing::trace!("already seen {}", discovered);
            return Ok(());
        }

        self.graph.add_edge(request.as_str(), discovered.as_str());
        self.counters.record_link_accepted();
        tracing::debug!("{} -> {}", request, discovered);

        if self.is_root(discovered.as_str()) {
            // The root was fetched by the orchestrator and is never expanded twice
            return Ok(());
        }

        let child = self.pending.acquire();
        let fetcher = self.fetcher.clone();
        tokio::spawn(
            async move {
                if let Err(e) = fetcher.fetch_with_ticket(discovered.clone(), child).await {
                    tracing::debug!("could not submit {}: {}", discovered, e);
                }
            }
            .instrument(tracing::Span::current()),
        );

        drop(ticket);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::FetchRequest;
    use crate::crawler::worker::{Worker, WorkerKind};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use url::Url;

    const SEED: &str = "http://example.com/";

    struct Harness {
        stage: TrackStage,
        requests: mpsc::Receiver<FetchRequest>,
        pending: Pending,
        counters: Arc<CrawlCounters>,
    }

    fn harness() -> Harness {
        let pending = Pending::new();
        let counters = Arc::new(CrawlCounters::new());
        let worker = Arc::new(Worker::new(WorkerKind::Fetcher, tracing::Span::none()));
        let (tx, rx) = mpsc::channel(16);
        let fetcher = Fetcher::new(worker, tx, pending.clone());
        let stage = TrackStage::new(
            fetcher,
            BloomFilter::with_rate(1000, 0.01),
            SiteGraph::with_root(SEED),
            pending.clone(),
            counters.clone(),
        );
        Harness {
            stage,
            requests: rx,
            pending,
            counters,
        }
    }

    fn url(s: &str) -> Url {
        normalize_url(s).unwrap()
    }

    fn link(h: &Harness, from: &str, to: &str) -> ParseMessage {
        ParseMessage {
            request: url(from),
            discovered: Url::parse(to).unwrap(),
            ticket: h.pending.acquire(),
        }
    }

    async fn next_request(h: &mut Harness) -> Option<FetchRequest> {
        tokio::time::timeout(Duration::from_millis(200), h.requests.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_new_link_recorded_and_submitted() {
        let mut h = harness();
        let message = link(&h, SEED, "http://example.com/about");
        h.stage.handle(message).await.unwrap();

        assert!(h
            .stage
            .graph()
            .has_edge(SEED, "http://example.com/about"));
        let request = next_request(&mut h).await.expect("fetch submitted");
        assert_eq!(request.url().as_str(), "http://example.com/about");

        // The submitted request holds the only remaining ticket
        assert_eq!(h.pending.outstanding(), 1);
        drop(request);
        assert!(h.pending.is_idle());
    }

    #[tokio::test]
    async fn test_duplicate_link_dropped() {
        let mut h = harness();
        let first = link(&h, SEED, "http://example.com/about");
        let second = link(&h, "http://example.com/contact", "http://example.com/about");

        h.stage.handle(first).await.unwrap();
        h.stage.handle(second).await.unwrap();

        assert!(next_request(&mut h).await.is_some());
        assert!(next_request(&mut h).await.is_none());
        assert_eq!(h.stage.graph().edge_count(), 1);
        assert!(!h
            .stage
            .graph()
            .has_edge("http://example.com/contact", "http://example.com/about"));
        assert_eq!(h.counters.snapshot(chrono::Utc::now(), chrono::Utc::now()).duplicates, 1);
    }

    #[tokio::test]
    async fn test_back_link_to_root_recorded_but_not_fetched() {
        let mut h = harness();
        let message = link(&h, "http://example.com/about", SEED);
        h.stage.handle(message).await.unwrap();

        assert!(h.stage.graph().has_edge("http://example.com/about", SEED));
        assert!(next_request(&mut h).await.is_none());
        assert!(h.pending.is_idle());

        // Only the first back-link is kept
        let again = link(&h, "http://example.com/contact", SEED);
        h.stage.handle(again).await.unwrap();
        assert_eq!(h.stage.graph().edge_count(), 1);
    }

    #[tokio::test]
    async fn test_discovered_url_is_renormalized() {
        let mut h = harness();
        let first = link(&h, SEED, "http://example.com/a");
        let second = link(&h, SEED, "http://EXAMPLE.com:80/a#frag");

        h.stage.handle(first).await.unwrap();
        h.stage.handle(second).await.unwrap();

        assert_eq!(h.stage.graph().node_count(), 2);
        assert!(h.stage.filter().contains("http://example.com/a"));
        assert_eq!(h.stage.filter().len(), 1);
        assert!(next_request(&mut h).await.is_some());
        assert!(next_request(&mut h).await.is_none());
    }

    #[tokio::test]
    async fn test_submission_to_stopped_fetcher_releases_ticket() {
        let h = harness();
        h.stage.fetcher.worker().request_stop();

        let mut stage = h.stage;
        let message = ParseMessage {
            request: url(SEED),
            discovered: url("http://example.com/x"),
            ticket: h.pending.acquire(),
        };
        stage.handle(message).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), h.pending.wait_idle())
            .await
            .expect("ticket should be released");
        assert!(stage.into_graph().contains("http://example.com/x"));
    }
}
