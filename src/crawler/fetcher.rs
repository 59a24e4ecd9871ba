//! Fetch stage: turns submitted URLs into fetch messages
//!
//! The stage is split in two halves:
//! - [`Fetcher`] is the cloneable submission handle (`fetch`)
//! - [`FetchStage`] is the run-loop side that performs the GET requests
//!
//! Submission is validated synchronously: a stopped fetcher or a non-HTTP
//! scheme is rejected before anything is queued.

use crate::crawler::counters::CrawlCounters;
use crate::crawler::http::{FetchedPage, HttpClient};
use crate::crawler::pending::{Pending, WorkTicket};
use crate::crawler::worker::{Stage, Worker};
use crate::url::ensure_http_scheme;
use crate::{CrawlError, TransportError};
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Result of one GET attempt, tagged with the URL that was requested
#[derive(Debug)]
pub struct FetchMessage {
    /// The URL handed to `fetch`
    pub request: Url,

    /// The fetched page, or why the GET failed
    pub outcome: Result<FetchedPage, TransportError>,

    pub(crate) ticket: WorkTicket,
}

impl FetchMessage {
    pub fn page(&self) -> Option<&FetchedPage> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&TransportError> {
        self.outcome.as_ref().err()
    }
}

/// A queued fetch request
#[derive(Debug)]
pub struct FetchRequest {
    url: Url,
    ticket: WorkTicket,
}

impl FetchRequest {
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Submission handle for the fetch worker
#[derive(Debug, Clone)]
pub struct Fetcher {
    worker: Arc<Worker>,
    requests: mpsc::Sender<FetchRequest>,
    pending: Pending,
}

impl Fetcher {
    pub fn new(worker: Arc<Worker>, requests: mpsc::Sender<FetchRequest>, pending: Pending) -> Self {
        Self {
            worker,
            requests,
            pending,
        }
    }

    pub fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }

    /// Queues `url` for fetching
    ///
    /// Waits only for room in the request queue; the GET itself happens on
    /// the fetch worker's task.
    ///
    /// # Errors
    ///
    /// * `CrawlError::AlreadyStopped` - The fetch worker has been cancelled
    /// * `CrawlError::InvalidScheme` - The URL is not `http`/`https`
    pub async fn fetch(&self, url: Url) -> Result<(), CrawlError> {
        self.check(&url)?;
        let ticket = self.pending.acquire();
        self.enqueue(url, ticket).await
    }

    /// Like [`fetch`](Self::fetch), with work accounted to a ticket the caller already holds
    pub(crate) async fn fetch_with_ticket(&self, url: Url, ticket: WorkTicket) -> Result<(), CrawlError> {
        self.check(&url)?;
        self.enqueue(url, ticket).await
    }

    fn check(&self, url: &Url) -> Result<(), CrawlError> {
        if self.worker.is_stopped() || self.worker.stop_requested() {
            return Err(CrawlError::AlreadyStopped {
                worker: self.worker.kind(),
            });
        }
        ensure_http_scheme(url)
    }

    async fn enqueue(&self, url: Url, ticket: WorkTicket) -> Result<(), CrawlError> {
        tracing::debug!(parent: self.worker.span(), "adding {} to request queue", url);
        self.requests
            .send(FetchRequest { url, ticket })
            .await
            .map_err(|_| CrawlError::AlreadyStopped {
                worker: self.worker.kind(),
            })
    }
}

/// Run-loop side of the fetcher
pub struct FetchStage<C> {
    client: C,
    results: mpsc::Sender<FetchMessage>,
    counters: Arc<CrawlCounters>,
}

impl<C: HttpClient> FetchStage<C> {
    pub fn new(client: C, results: mpsc::Sender<FetchMessage>, counters: Arc<CrawlCounters>) -> Self {
        Self {
            client,
            results,
            counters,
        }
    }
}

impl<C: HttpClient> Stage for FetchStage<C> {
    type Input = FetchRequest;

    async fn handle(&mut self, request: FetchRequest) -> Result<(), CrawlError> {
        let FetchRequest { url, ticket } = request;

        let outcome = self.client.get(&url).await;
        match &outcome {
            Ok(page) => {
                self.counters.record_fetched();
                tracing::debug!("fetched {} (HTTP {})", url, page.status);
            }
            Err(e) => {
                self.counters.record_fetch_failure();
                tracing::debug!("fetch of {} failed: {}", url, e);
            }
        }

        let message = FetchMessage {
            request: url,
            outcome,
            ticket,
        };

        if let Err(mpsc::error::SendError(message)) = self.results.send(message).await {
            tracing::warn!("parser is gone, dropping result for {}", message.request);
        }

        Ok(())
    }
}
