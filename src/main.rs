//! Sitemap crawler main entry point
//!
//! This is the command-line interface: crawl one site from a seed URL and
//! write its link tree to a file.

use anyhow::Context;
use clap::Parser;
use sitemap_crawler::config::{load_config, validate, Config};
use sitemap_crawler::crawl;
use sitemap_crawler::output::{export_to_path, print_statistics};
use sitemap_crawler::url::{normalize_url, with_default_scheme};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Maps the link structure of a single website
///
/// Starting from SEED, every same-site page reachable through `<a href>`
/// links is fetched once. The resulting tree is written to the output file:
/// indented plain text, or markdown when the path ends in `.md`.
#[derive(Parser, Debug)]
#[command(name = "sitemap-crawler")]
#[command(version)]
#[command(about = "Maps the link structure of a single website", long_about = None)]
struct Cli {
    /// Seed URL; `http://` is assumed when no scheme is given
    #[arg(value_name = "SEED")]
    seed: String,

    /// Where to write the site map [default: result.out]
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Give up on the crawl after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print crawl statistics when done
    #[arg(long)]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let seed = normalize_url(&with_default_scheme(&cli.seed))
        .with_context(|| format!("invalid seed URL '{}'", cli.seed))?;

    tracing::info!("Crawling {}", seed);
    let report = crawl(&seed, &config)
        .await
        .with_context(|| format!("crawl of {} failed", seed))?;

    let output = PathBuf::from(&config.output.path);
    export_to_path(&report.graph, Some(&report.stats), &output)
        .with_context(|| format!("could not write {}", output.display()))?;

    if cli.stats {
        print_statistics(&report.stats, &report.graph);
    }
    if !cli.quiet {
        println!("Site map written to {}", output.display());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_crawler=info,warn"),
            1 => EnvFilter::new("sitemap_crawler=debug,info"),
            2 => EnvFilter::new("sitemap_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration file, if any, and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(timeout) = cli.timeout {
        config.crawler.crawl_timeout_secs = Some(timeout);
    }
    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}
