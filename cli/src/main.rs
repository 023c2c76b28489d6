//! Sparx CLI
//!
//! Evaluates a path-only XPath query against an XML document, in parallel
//! chunks or sequentially.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use sparx::{Automaton, Mode};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// =============================================================================
// CLI DEFINITION
// =============================================================================

#[derive(Parser)]
#[command(name = "sparx")]
#[command(about = "Parallel XPath evaluation over chunked XML", long_about = None)]
#[command(version)]
struct Cli {
    /// XML document to query
    #[arg(value_name = "XML", default_value = "test.xml")]
    xml: PathBuf,

    /// File holding the XPath expression (a single /a/b/.../z line)
    #[arg(value_name = "XPATH", default_value = "XPath.txt")]
    xpath: PathBuf,

    /// Number of workers (chunks) in parallel mode
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Process the document in parallel chunks or as one sequential pass
    #[arg(short, long, value_enum, default_value_t = RunMode::Parallel)]
    mode: RunMode,

    /// Show per-worker progress and timings
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum RunMode {
    /// One chunk, no threads
    Sequential,
    /// One chunk per worker
    Parallel,
}

impl From<RunMode> for Mode {
    fn from(mode: RunMode) -> Self {
        match mode {
            RunMode::Sequential => Self::Sequential,
            RunMode::Parallel => Self::Parallel,
        }
    }
}

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.threads == 0 {
        bail!("worker count must be at least 1");
    }

    let raw_path = fs::read_to_string(&cli.xpath)
        .with_context(|| format!("failed to read XPath file: {}", cli.xpath.display()))?;
    let automaton = Automaton::compile(raw_path.trim().as_bytes());
    println!("{automaton}");

    let started = Instant::now();
    let mapping = sparx::evaluate_file(&automaton, &cli.xml, cli.threads, cli.mode.into())
        .with_context(|| format!("failed to read XML file: {}", cli.xml.display()))?;
    tracing::info!(elapsed = ?started.elapsed(), "query finished");

    match mapping {
        Some(mapping) => println!("mapping: {mapping}"),
        None => println!("no match for this query"),
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
