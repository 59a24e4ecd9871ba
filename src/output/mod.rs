//! Output module for exporting crawl results
//!
//! This module handles:
//! - Writing the site graph as an indented text tree
//! - Writing a markdown site map with run statistics
//! - Recording and printing crawl statistics

mod markdown;
pub mod stats;
mod text;
mod traits;

pub use markdown::{format_markdown, MarkdownExporter};
pub use stats::{print_statistics, CrawlStats};
pub use text::{format_text_tree, TextExporter};
pub use traits::{Exporter, OutputError, OutputResult};

use crate::graph::SiteGraph;
use std::path::Path;

/// Returns true if `path` should be written as markdown
pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

/// Writes the graph to `path`, choosing the format from the extension
///
/// `.md` and `.markdown` files get the markdown site map; anything else gets
/// the plain-text tree.
///
/// # Arguments
///
/// * `graph` - The crawled graph
/// * `stats` - Run statistics, included in markdown output
/// * `path` - Destination file; created or truncated
pub fn export_to_path(
    graph: &SiteGraph,
    stats: Option<&CrawlStats>,
    path: &Path,
) -> OutputResult<()> {
    if is_markdown_path(path) {
        tracing::debug!("writing markdown site map to {}", path.display());
        MarkdownExporter.export_to_file(graph, stats, path)
    } else {
        tracing::debug!("writing text site map to {}", path.display());
        TextExporter.export_to_file(graph, stats, path)
    }
}
