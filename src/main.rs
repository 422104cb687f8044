//! Sumi-Trawl main entry point
//!
//! This is the command-line interface for the Sumi-Trawl harvester. Records
//! are written to stdout as JSON lines; logs go to stderr.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use sumi_trawl::config::{load_config_with_hash, validate, Config};
use sumi_trawl::job::{seed_urls, JobEvent, JobHandle, JobManager, JobRequest, SelectorInput};
use tracing_subscriber::EnvFilter;

/// Sumi-Trawl: a structured web harvester
///
/// Crawls outward from a seed URL, or discovers pages through a search
/// provider, and prints one JSON record per harvested page.
#[derive(Parser, Debug)]
#[command(name = "sumi-trawl")]
#[command(version = "1.0.0")]
#[command(about = "A structured web harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Validate config and show the seed URLs without crawling
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl outward from a seed URL
    Site {
        /// The URL to start from
        url: String,

        #[command(flatten)]
        options: JobOptions,
    },

    /// Harvest pages found through the search provider
    Gather {
        /// Topic to search for
        #[arg(short, long)]
        topic: Option<String>,

        #[command(flatten)]
        options: JobOptions,
    },
}

#[derive(Args, Debug)]
struct JobOptions {
    /// Comma-separated keywords a page must mention
    #[arg(short, long)]
    keywords: Option<String>,

    /// Comma-separated extractors: text, headings, meta, images, links
    #[arg(short, long)]
    selectors: Option<String>,

    /// Maximum records to emit
    #[arg(short, long)]
    limit: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_ref())?;
    let request = build_request(cli.command);

    if cli.dry_run {
        return handle_dry_run(&config, request);
    }

    let manager = JobManager::new(config).context("failed to build HTTP client")?;
    let handle = manager.start_job(request)?;
    handle_job(&manager, handle).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_trawl=info,warn"),
            1 => EnvFilter::new("sumi_trawl=debug,info"),
            2 => EnvFilter::new("sumi_trawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let config = Config::default();
            validate(&config)?;
            tracing::debug!("No configuration file given, using defaults");
            Ok(config)
        }
    }
}

fn build_request(command: Command) -> JobRequest {
    let (mut request, options) = match command {
        Command::Site { url, options } => (JobRequest::site(url), options),
        Command::Gather { topic, options } => (
            JobRequest {
                topic,
                ..JobRequest::gather("")
            },
            options,
        ),
    };

    request.keywords = options.keywords;
    request.selectors = options.selectors.map(SelectorInput::Csv);
    if let Some(limit) = options.limit {
        request = request.with_limit(limit);
    }
    request
}

/// Handles the --dry-run mode: validates the request and prints its seeds
fn handle_dry_run(config: &Config, request: JobRequest) -> anyhow::Result<()> {
    let spec = request.into_spec(&config.crawler)?;
    let seeds = seed_urls(&spec, config)?;

    println!("=== Sumi-Trawl Dry Run ===\n");
    println!("Mode: {}", spec.mode);
    println!("Limit: {} records, {} requests", spec.limit, spec.max_requests());
    println!(
        "Selectors: {}",
        spec.selectors
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Keywords: {}", spec.keywords.keywords().join(", "));
    println!(
        "Concurrency: {} fetches, {}ms timeout, {} attempts",
        config.crawler.max_concurrent_fetches,
        config.crawler.request_timeout_ms,
        config.crawler.max_attempts
    );

    println!("\nSeed URLs ({}):", seeds.len());
    for (url, label) in &seeds {
        println!("  - {} ({:?})", url, label);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Streams a job's records to stdout until it ends; Ctrl-C stops the job
async fn handle_job(manager: &JobManager, mut handle: JobHandle) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    let mut interrupted = false;

    loop {
        let event = tokio::select! {
            event = handle.events.recv() => event,
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                signal.context("failed to listen for Ctrl-C")?;
                tracing::info!("Interrupted, stopping job {}", handle.id);
                manager.stop_job(handle.id);
                interrupted = true;
                continue;
            }
        };

        match event {
            Some(JobEvent::Record(record)) => {
                serde_json::to_writer(&mut stdout, &record)?;
                writeln!(stdout)?;
            }
            Some(JobEvent::Complete(stats)) => {
                stdout.flush()?;
                tracing::info!(
                    "Job {} complete: {} records from {} requests",
                    handle.id,
                    stats.records_emitted,
                    stats.requests
                );
                return Ok(());
            }
            Some(JobEvent::Error(message)) => {
                stdout.flush()?;
                anyhow::bail!("job {} failed: {}", handle.id, message);
            }
            None => anyhow::bail!("job {} ended without a final event", handle.id),
        }
    }
}
