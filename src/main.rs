//! # Motif Census
//!
//! Counts local structural patterns in a directed graph with a Pregel-style
//! vertex program: mutual pairs, shared successors ("through") and 2-hop
//! return paths ("cycle").
//!
//! This application demonstrates:
//! - Bulk-synchronous-parallel graph computation on tokio
//! - Global convergence detection with a sum aggregator
//! - CLI design with clap
//! - Structured logging with tracing
//! - Layered configuration (YAML job file, environment, flags)
//!
//! ## Quick Start
//! ```bash
//! cargo run -- graph.txt
//! ```

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

/// Configuration management
mod config;

// =============================================================================
// IMPORTS
// =============================================================================
use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pregel_motifs::pregel::parse_workers;
use pregel_motifs::{
    pattern_runtime, Counter, EdgeListReader, OutputFormat, PregelError, ResultWriter, VertexId,
};

use crate::config::Config;

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
/// # Rust Concept: Derive Macros with Clap
///
/// Every optional flag overrides the job file and the environment. Flags
/// with `env = ...` also read that variable when the flag is absent.
#[derive(Parser, Debug)]
#[command(
    name = "motif-census",
    version = "0.1.0",
    about = "Counts mutual, through and cycle patterns in a directed graph",
    long_about = r#"
Motif Census - structural pattern counts for every vertex of a directed graph.

Each vertex learns about its neighborhood only from messages exchanged with
its neighbors, superstep by superstep, and the job stops once no vertex's
counters changed in a superstep after the warm-up period.

INPUT FORMAT:
  line 1: total vertex count
  line 2: total edge count
  then one "source target [weight]" edge per line, sorted by source

OUTPUT:
  <id>: in <n> out <n> through <n> cycle <n>     (one line per vertex)

EXAMPLES:
  # Census of a graph, results to stdout
  motif-census graph.txt

  # JSON lines to a file, two local workers
  motif-census graph.txt -o counts.jsonl --format json --workers localhost:1411,localhost:1421

  # Plain edge list without the count header
  motif-census --no-header edges.txt
"#
)]
struct Args {
    /// Edge list to analyze
    #[arg(value_name = "GRAPH")]
    input: PathBuf,

    /// Write results here instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// YAML job file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fail if the job has not converged after this many supersteps
    #[arg(long = "max-supersteps", env = "MOTIF_MAX_SUPERSTEPS")]
    max_supersteps: Option<usize>,

    /// Supersteps before a zero global delta may halt the job
    #[arg(long = "warmup", env = "MOTIF_WARMUP")]
    warmup: Option<usize>,

    /// Worker partitions computed concurrently
    #[arg(short = 'p', long = "parallelism", env = "MOTIF_PARALLELISM")]
    parallelism: Option<usize>,

    /// Comma-separated host:port worker list
    #[arg(short = 'w', long = "workers", env = "MOTIF_WORKERS")]
    workers: Option<String>,

    /// Cap on neighbor ids each vertex re-announces per superstep
    #[arg(long = "max-announced", env = "MOTIF_MAX_ANNOUNCED")]
    max_announced: Option<usize>,

    /// Output format: text or json
    #[arg(short = 'f', long = "format")]
    format: Option<OutputFormat>,

    /// Input has no vertex-count / edge-count header lines
    #[arg(long = "no-header", default_value = "false")]
    no_header: bool,

    /// Verbose output (debug logging)
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Enable verbose/debug logging",
        default_value = "false"
    )]
    verbose: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(max) = self.max_supersteps {
            config.pregel.max_supersteps = max;
        }
        if let Some(warmup) = self.warmup {
            config.motif.warmup_supersteps = warmup;
        }
        if let Some(parallelism) = self.parallelism {
            config.pregel.parallelism = parallelism;
        }
        if let Some(workers) = &self.workers {
            config.pregel.workers = parse_workers(workers).context("invalid --workers list")?;
        }
        if let Some(cap) = self.max_announced {
            config.motif.max_announced_ids = Some(cap);
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.no_header {
            config.header = false;
        }
        Ok(())
    }
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so `env = ...` flags see its variables
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config)?;

    init_logging(args.verbose, &config.log_level)?;
    config.validate()?;

    info!(
        workers = config.pregel.worker_count(),
        parallelism = config.pregel.parallelism,
        max_supersteps = config.pregel.max_supersteps,
        warmup = config.motif.warmup_supersteps,
        "Configuration loaded"
    );

    match run(&args, &config).await {
        Ok(lines) => {
            info!(vertices = lines, "Census completed successfully");
            Ok(())
        }
        Err(e) => {
            match failure_kind(&e) {
                FailureKind::Limit => warn!(
                    error = %e,
                    "Census did not converge; raise --max-supersteps or the job timeout"
                ),
                FailureKind::Protocol => error!(error = %e, "Census aborted on a malformed message"),
                FailureKind::Other => error!(error = %e, "Census failed"),
            }
            Err(e)
        }
    }
}

/// How a failed run ended, for the final log line
#[derive(Debug, PartialEq, Eq)]
enum FailureKind {
    /// Superstep limit or job timeout hit before convergence
    Limit,
    /// A vertex received a record it could not decode
    Protocol,
    Other,
}

fn failure_kind(err: &anyhow::Error) -> FailureKind {
    match err.downcast_ref::<PregelError>() {
        Some(e) if e.is_limit() => FailureKind::Limit,
        Some(e) if e.is_protocol_error() => FailureKind::Protocol,
        _ => FailureKind::Other,
    }
}

/// Read the graph, run the census and write the results
async fn run(args: &Args, config: &Config) -> Result<usize> {
    let reader = if config.header {
        EdgeListReader::new()
    } else {
        EdgeListReader::without_header()
    };
    let graph = reader
        .read_path(&args.input)
        .with_context(|| format!("failed to read graph from {}", args.input.display()))?;

    info!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "Graph loaded"
    );

    let mut runtime = pattern_runtime(config.pregel.clone(), config.motif.clone())?;
    graph.load_into(&mut runtime);

    let result = runtime.run().await.context("census job failed")?;
    info!(
        job_id = %result.job_id,
        supersteps = result.supersteps,
        messages = result.messages_routed,
        "Job finished"
    );

    write_results(&result.values, args.output.as_deref(), config.format)
}

/// Write one line per vertex to `path`, or stdout when no path is given
fn write_results(
    values: &BTreeMap<VertexId, Counter>,
    path: Option<&Path>,
    format: OutputFormat,
) -> Result<usize> {
    fn write_to<W: Write>(
        out: W,
        values: &BTreeMap<VertexId, Counter>,
        format: OutputFormat,
    ) -> Result<usize> {
        let mut writer = ResultWriter::new(out, format);
        let lines = writer.write_all(values)?;
        writer.finish()?;
        Ok(lines)
    }

    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_to(BufWriter::new(file), values, format)
        }
        None => write_to(std::io::stdout().lock(), values, format),
    }
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Initialize the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout carries only the results. `--verbose` wins
/// over the configured filter.
fn init_logging(verbose: bool, directive: &str) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true) // Show the module that logged
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    // Set as the global default
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
