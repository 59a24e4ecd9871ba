//! Crawl statistics
//!
//! Counters collected while the workers run, frozen into a [`CrawlStats`]
//! when the crawl finishes.

use crate::graph::SiteGraph;
use chrono::{DateTime, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Successful GETs
    pub pages_fetched: u64,

    /// GETs that ended in a transport error or an HTTP error status
    pub fetch_failures: u64,

    /// In-scope links emitted by the parser
    pub links_found: u64,

    /// Links recorded in the graph
    pub links_accepted: u64,

    /// Links dropped by the dedup filter
    pub duplicates: u64,
}

impl CrawlStats {
    /// Wall-clock duration of the crawl in milliseconds
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Share of fetches that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempts = self.pages_fetched + self.fetch_failures;
        if attempts == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / attempts as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `graph` - The graph the statistics belong to
pub fn print_statistics(stats: &CrawlStats, graph: &SiteGraph) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    if let Some(root) = graph.root() {
        println!("  Seed: {}", root);
    }
    println!("  Pages in site map: {}", graph.node_count());
    println!("  Links in site map: {}", graph.edge_count());
    println!(
        "  Duration: {:.2}s",
        stats.duration_ms() as f64 / 1000.0
    );
    println!();

    println!("Pipeline:");
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Fetch failures: {}", stats.fetch_failures);
    println!("  Links found: {}", stats.links_found);
    println!("  Links accepted: {}", stats.links_accepted);
    println!("  Duplicates dropped: {}", stats.duplicates);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} fetches succeeded)",
        stats.success_rate(),
        stats.pages_fetched,
        stats.pages_fetched + stats.fetch_failures
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn stats(fetched: u64, failed: u64) -> CrawlStats {
        let started_at = Utc::now();
        CrawlStats {
            started_at,
            finished_at: started_at + Duration::milliseconds(1500),
            pages_fetched: fetched,
            fetch_failures: failed,
            links_found: 0,
            links_accepted: 0,
            duplicates: 0,
        }
    }

    #[test]
    fn test_duration() {
        assert_eq!(stats(0, 0).duration_ms(), 1500);
    }

    #[test]
    fn test_success_rate() {
        let rate = stats(80, 20).success_rate();
        assert!((rate - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_pages() {
        assert_eq!(stats(0, 0).success_rate(), 0.0);
    }
}
