//! Exporter trait and output errors

use crate::graph::SiteGraph;
use crate::output::stats::CrawlStats;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Nothing to export: the site graph has no root")]
    EmptyGraph,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Renders a finished site graph
pub trait Exporter {
    /// Writes `graph` to `out`
    ///
    /// # Arguments
    ///
    /// * `graph` - The crawled graph; must have a root
    /// * `stats` - Run statistics, for formats that report them
    /// * `out` - Destination
    fn export(
        &self,
        graph: &SiteGraph,
        stats: Option<&CrawlStats>,
        out: &mut dyn Write,
    ) -> OutputResult<()>;

    /// Writes the export to a newly created file at `path`
    fn export_to_file(
        &self,
        graph: &SiteGraph,
        stats: Option<&CrawlStats>,
        path: &Path,
    ) -> OutputResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.export(graph, stats, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
