//! Atomic crawl counters
//!
//! Updated by the stages as messages flow and turned into a [`CrawlStats`]
//! snapshot when the crawl ends.

use crate::output::CrawlStats;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live crawl counters, shared by the three stages
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pages_fetched: AtomicU64,
    fetch_failures: AtomicU64,
    links_found: AtomicU64,
    links_accepted: AtomicU64,
    duplicates: AtomicU64,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_link_found(&self) {
        self.links_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_link_accepted(&self) {
        self.links_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    /// Freezes the counters into a statistics record
    pub fn snapshot(&self, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> CrawlStats {
        CrawlStats {
            started_at,
            finished_at,
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            links_found: self.links_found.load(Ordering::Relaxed),
            links_accepted: self.links_accepted.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
        }
    }
}
