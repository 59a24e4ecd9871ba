//! Markdown site map generation
//!
//! This module renders a finished crawl as a markdown document: run
//! statistics followed by the site tree as a nested list.

use crate::graph::SiteGraph;
use crate::output::stats::CrawlStats;
use crate::output::text::walk_tree;
use crate::output::traits::{Exporter, OutputResult};
use std::io::Write;

/// Writes the markdown format
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownExporter;

impl Exporter for MarkdownExporter {
    fn export(
        &self,
        graph: &SiteGraph,
        stats: Option<&CrawlStats>,
        out: &mut dyn Write,
    ) -> OutputResult<()> {
        let markdown = format_markdown(graph, stats)?;
        out.write_all(markdown.as_bytes())?;
        Ok(())
    }
}

/// Formats a crawl as markdown
///
/// # Arguments
///
/// * `graph` - The crawled graph
/// * `stats` - Run statistics; the statistics section is omitted when `None`
///
/// # Returns
///
/// A formatted markdown string, or `OutputError::EmptyGraph` for a graph
/// without a root
pub fn format_markdown(graph: &SiteGraph, stats: Option<&CrawlStats>) -> OutputResult<String> {
    let tree = walk_tree(graph)?;
    let mut md = String::new();

    // Title
    md.push_str("# Site Map\n\n");
    if let Some(root) = graph.root() {
        md.push_str(&format!("- **Seed**: {}\n", root));
    }
    md.push_str(&format!("- **Pages**: {}\n", graph.node_count()));
    md.push_str(&format!("- **Links**: {}\n\n", graph.edge_count()));

    if let Some(stats) = stats {
        md.push_str("## Run Information\n\n");
        md.push_str(&format!("- **Started**: {}\n", stats.started_at.to_rfc3339()));
        md.push_str(&format!("- **Finished**: {}\n", stats.finished_at.to_rfc3339()));
        md.push_str(&format!(
            "- **Duration**: {:.2} seconds\n\n",
            stats.duration_ms() as f64 / 1000.0
        ));

        md.push_str("## Statistics\n\n");
        md.push_str("| Metric | Count |\n");
        md.push_str("|--------|-------|\n");
        md.push_str(&format!("| Pages fetched | {} |\n", stats.pages_fetched));
        md.push_str(&format!("| Fetch failures | {} |\n", stats.fetch_failures));
        md.push_str(&format!("| Links found | {} |\n", stats.links_found));
        md.push_str(&format!("| Links accepted | {} |\n", stats.links_accepted));
        md.push_str(&format!("| Duplicates dropped | {} |\n\n", stats.duplicates));
    }

    md.push_str("## Pages\n\n");
    for line in tree {
        md.push_str(&"  ".repeat(line.depth));
        if line.revisit {
            md.push_str(&format!("- <{}> *(see above)*\n", line.url));
        } else {
            md.push_str(&format!("- <{}>\n", line.url));
        }
    }

    Ok(md)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputError;
    use chrono::Utc;

    const SEED: &str = "http://example.com/";

    fn graph() -> SiteGraph {
        let mut graph = SiteGraph::with_root(SEED);
        graph.add_edge(SEED, "http://example.com/about");
        graph.add_edge("http://example.com/about", SEED);
        graph
    }

    #[test]
    fn test_markdown_tree() {
        let md = format_markdown(&graph(), None).unwrap();

        assert!(md.starts_with("# Site Map\n"));
        assert!(md.contains("- **Seed**: http://example.com/\n"));
        assert!(md.contains("- **Links**: 2\n"));
        assert!(md.contains(
            "## Pages\n\n\
             - <http://example.com/>\n  \
             - <http://example.com/about>\n    \
             - <http://example.com/> *(see above)*\n"
        ));
        assert!(!md.contains("## Statistics"));
    }

    #[test]
    fn test_markdown_with_statistics() {
        let now = Utc::now();
        let stats = CrawlStats {
            started_at: now,
            finished_at: now,
            pages_fetched: 2,
            fetch_failures: 0,
            links_found: 3,
            links_accepted: 2,
            duplicates: 1,
        };

        let md = format_markdown(&graph(), Some(&stats)).unwrap();
        assert!(md.contains("## Statistics"));
        assert!(md.contains("| Pages fetched | 2 |"));
        assert!(md.contains("| Duplicates dropped | 1 |"));
    }

    #[test]
    fn test_markdown_empty_graph() {
        let result = format_markdown(&SiteGraph::new(), None);
        assert!(matches!(result, Err(OutputError::EmptyGraph)));
    }
}
