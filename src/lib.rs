//! Sitemap crawler: maps the link graph of a single site
//!
//! This crate crawls one domain from a seed URL with three cooperating
//! workers (fetch, parse, track) connected by channels, and returns the
//! directed graph of same-site links once the pipeline goes quiet.

pub mod config;
pub mod crawler;
pub mod dedup;
pub mod graph;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Unsupported URL scheme '{scheme}' in {url}")]
    InvalidScheme { url: String, scheme: String },

    #[error("{worker} is in state stopped")]
    AlreadyStopped { worker: crawler::WorkerKind },

    #[error("Could not fetch seed {url}: {source}")]
    SeedFetch {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("Crawl did not finish within {limit:?}")]
    Timeout { limit: std::time::Duration },

    #[error("{worker} task panicked")]
    WorkerPanicked { worker: crawler::WorkerKind },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Failure of a single GET, carried inside a fetch message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("server answered HTTP {0}")]
    Status(u16),

    #[error("could not read body: {0}")]
    Body(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL normalization errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL has no scheme or host: {0}")]
    RelativeUrl(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlReport, Crawler, CrawlerSettings};
pub use graph::SiteGraph;
pub use crate::url::normalize_url;
