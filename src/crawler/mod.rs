//! Crawler module: the concurrent crawl engine
//!
//! This module contains the core crawling logic, including:
//! - The worker state machine shared by every stage
//! - HTTP fetching behind the `HttpClient` capability
//! - HTML parsing and same-site link extraction
//! - Link tracking, deduplication and graph building
//! - In-flight work accounting and overall crawl coordination

mod coordinator;
mod counters;
mod fetcher;
mod http;
mod parser;
mod pending;
mod tracker;
mod worker;

pub use coordinator::{crawl, CrawlReport, Crawler, CrawlerSettings};
pub use counters::CrawlCounters;
pub use fetcher::{FetchMessage, FetchRequest, FetchStage, Fetcher};
pub use http::{build_http_client, FetchedPage, HttpClient, ReqwestClient};
pub use parser::{extract_links, ParseMessage, ParseStage};
pub use pending::{Pending, WorkTicket};
pub use tracker::TrackStage;
pub use worker::{Stage, Worker, WorkerKind, WorkerState};
