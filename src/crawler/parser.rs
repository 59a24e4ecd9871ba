//! Parse stage: extracts same-site links from fetched pages
//!
//! For every fetched page the parser:
//! - finds each `<a>` element carrying an `href`
//! - rewrites root-relative hrefs (`/about`) onto the seed's scheme and host
//! - normalizes the result and keeps it only if it starts with the seed URL
//! - emits one [`ParseMessage`] per kept link
//!
//! A failed fetch of the seed itself is fatal and stops the parser; any other
//! failed fetch is logged and dropped.

use crate::crawler::counters::CrawlCounters;
use crate::crawler::fetcher::FetchMessage;
use crate::crawler::pending::{Pending, WorkTicket};
use crate::crawler::worker::{Stage, Worker};
use crate::url::{in_scope, normalize_url, resolve_href};
use crate::CrawlError;
use scraper::{Html, Selector};
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// A link found on a page
#[derive(Debug)]
pub struct ParseMessage {
    /// The page the link was found on
    pub request: Url,

    /// The normalized target of the anchor
    pub discovered: Url,

    pub(crate) ticket: WorkTicket,
}

/// Extracts every in-scope link from an HTML document
///
/// # Link Extraction Rules
///
/// - Only `<a href="...">` elements are considered; anchors without `href` are ignored
/// - `/path` and `//host/path` are resolved against the seed's origin
/// - Links that fail normalization, are not `http`/`https`, or do not
///   start with the seed URL are dropped
///
/// Links are returned in document order and may contain duplicates.
///
/// # Example
///
/// ```
/// use sitemap_crawler::crawler::extract_links;
/// use sitemap_crawler::url::normalize_url;
///
/// let seed = normalize_url("http://example.com/").unwrap();
/// let html = r#"<a href="/about">About</a> <a href="http://other.com/">Elsewhere</a>"#;
/// let links = extract_links(html, &seed);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "http://example.com/about");
/// ```
pub fn extract_links(html: &str, seed: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = qualify_link(href, seed) {
                    links.push(url);
                }
            }
        }
    }

    links
}

/// Resolves, normalizes and scope-checks a single href
fn qualify_link(href: &str, seed: &Url) -> Option<Url> {
    let candidate = resolve_href(href, seed);

    match normalize_url(&candidate) {
        Ok(url) if in_scope(&url, seed) => Some(url),
        Ok(url) => {
            tracing::trace!("skipping out-of-scope link {}", url);
            None
        }
        Err(e) => {
            tracing::trace!("error while normalizing {:?}: {}", candidate, e);
            None
        }
    }
}

/// Run-loop side of the parser
pub struct ParseStage {
    worker: Arc<Worker>,
    seed: Url,
    results: mpsc::Sender<ParseMessage>,
    pending: Pending,
    counters: Arc<CrawlCounters>,
}

impl ParseStage {
    /// Creates a parser bound to a normalized seed
    pub fn new(
        worker: Arc<Worker>,
        seed: Url,
        results: mpsc::Sender<ParseMessage>,
        pending: Pending,
        counters: Arc<CrawlCounters>,
    ) -> Self {
        Self {
            worker,
            seed,
            results,
            pending,
            counters,
        }
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }
}

impl Stage for ParseStage {
    type Input = FetchMessage;

    async fn handle(&mut self, message: FetchMessage) -> Result<(), CrawlError> {
        let FetchMessage {
            request,
            outcome,
            ticket,
        } = message;

        let page = match outcome {
            Ok(page) => page,
            Err(e) if request.as_str() == self.seed.as_str() => {
                tracing::error!("could not get seed {}: {}", request, e);
                self.worker.request_stop();
                return Err(CrawlError::SeedFetch {
                    url: request.to_string(),
                    source: e,
                });
            }
            Err(e) => {
                tracing::warn!("could not get {}: {}", request, e);
                return Ok(());
            }
        };

        let links = extract_links(&page.body, &self.seed);
        tracing::debug!("found {} in-scope links on {}", links.len(), request);

        for discovered in links {
            self.counters.record_link_found();
            tracing::trace!("passing {} to tracker", discovered);

            let message = ParseMessage {
                request: request.clone(),
                discovered,
                ticket: self.pending.acquire(),
            };
            if self.results.send(message).await.is_err() {
                tracing::warn!("tracker is gone, dropping links from {}", request);
                break;
            }
        }

        // Released only after every child ticket exists
        drop(ticket);
        Ok(())
    }
}
