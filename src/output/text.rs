//! Plain-text tree export
//!
//! The graph is written depth-first from the root, one URL per line, two
//! spaces of indentation per level:
//!
//! ```text
//! http://example.com/
//!   http://example.com/contact/
//!     http://example.com/news/
//!       http://example.com/
//! ```
//!
//! A URL reached a second time is printed again but not expanded, which
//! keeps cyclic graphs finite.

use crate::graph::SiteGraph;
use crate::output::stats::CrawlStats;
use crate::output::traits::{Exporter, OutputError, OutputResult};
use std::io::Write;

/// One line of the depth-first walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TreeLine<'a> {
    pub depth: usize,
    pub url: &'a str,
    /// The URL was already expanded earlier in the walk
    pub revisit: bool,
}

/// Depth-first walk from the root, children in insertion order
pub(crate) fn walk_tree(graph: &SiteGraph) -> OutputResult<Vec<TreeLine<'_>>> {
    let root = graph.root_id().ok_or(OutputError::EmptyGraph)?;

    let mut lines = Vec::with_capacity(graph.node_count());
    let mut expanded = vec![false; graph.node_count()];
    let mut stack = vec![(root, 0usize)];

    while let Some((id, depth)) = stack.pop() {
        let Some(url) = graph.url(id) else {
            continue;
        };
        let revisit = expanded[id.index()];
        lines.push(TreeLine {
            depth,
            url,
            revisit,
        });

        if !revisit {
            expanded[id.index()] = true;
            for &child in graph.neighbor_ids(id).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    Ok(lines)
}

/// Writes the indented-tree text format
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExporter;

impl Exporter for TextExporter {
    fn export(
        &self,
        graph: &SiteGraph,
        _stats: Option<&CrawlStats>,
        out: &mut dyn Write,
    ) -> OutputResult<()> {
        for line in walk_tree(graph)? {
            writeln!(out, "{:indent$}{}", "", line.url, indent = line.depth * 2)?;
        }
        Ok(())
    }
}

/// Formats the tree as a string
pub fn format_text_tree(graph: &SiteGraph) -> OutputResult<String> {
    let mut buffer = Vec::new();
    TextExporter.export(graph, None, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
