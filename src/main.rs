// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vector_suite::api::{self, AppState};
use vector_suite::cancel::CancelToken;
use vector_suite::config::{ConfigLoader, ScannerConfig};
use vector_suite::engine::SuiteRunner;
use vector_suite::progress::ProgressTracker;
use vector_suite::registry::ProbeRegistry;
use vector_suite::reporting::{ReportEngine, ReportFormat};
use vector_suite::types::{ProbeCategory, ProbeOutcome};

/// Attack-vector test suites against web and LLM applications
#[derive(Parser)]
#[command(name = "vector-suite")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version)]
#[command(about = "Run categorized vulnerability probe suites and report the findings", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file path (yaml, toml or json)
    #[arg(short, long, global = true, env = "VECTOR_SUITE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Listen address, overrides the configured bind_address
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Run a probe suite against a target
    Scan {
        /// Target URL
        target: String,

        /// Probe category: owasp, llm, infra or all
        #[arg(long, default_value = "all")]
        category: String,

        /// Report format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Permit loopback and private targets
        #[arg(long)]
        allow_local: bool,
    },

    /// List registered probes
    List,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
    Csv,
    Html,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Markdown => ReportFormat::Markdown,
            OutputFormat::Csv => ReportFormat::Csv,
            OutputFormat::Html => ReportFormat::Html,
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    // RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<ScannerConfig> {
    match path {
        Some(path) => ConfigLoader::new(path)?
            .load()
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => ScannerConfig::from_env(),
    }
}

fn build_runner(config: &ScannerConfig) -> Result<SuiteRunner> {
    let registry = ProbeRegistry::with_builtin_probes().context("Failed to register built-in probes")?;
    SuiteRunner::from_config(config, Arc::new(registry), Arc::new(ProgressTracker::new()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn serve(config: ScannerConfig, bind: Option<String>) -> Result<()> {
    let addr: SocketAddr = match bind {
        Some(bind) => bind
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", bind))?,
        None => config.socket_addr()?,
    };

    let state = Arc::new(AppState::new(build_runner(&config)?));
    info!("{} probes registered", state.registry.len());
    api::serve(state, addr, shutdown_signal()).await
}

async fn scan(
    mut config: ScannerConfig,
    target: String,
    category: String,
    format: OutputFormat,
    output: Option<PathBuf>,
    allow_local: bool,
) -> Result<()> {
    if allow_local {
        config.safe_testing_mode = false;
    }
    let runner = build_runner(&config)?;

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        on_signal.cancel();
    });

    let category = match category.to_lowercase().as_str() {
        "all" => None,
        label => Some(ProbeCategory::parse(label)),
    };

    let result = runner
        .run_with_cancel(&target, category.as_ref(), &cancel)
        .await?;

    for run in &result.per_probe_status {
        match &run.outcome {
            ProbeOutcome::Success { findings } => info!("{}: {} findings", run.probe_name, findings),
            ProbeOutcome::Failed { error } => warn!("{}: failed: {}", run.probe_name, error),
            ProbeOutcome::Cancelled => warn!("{}: cancelled", run.probe_name),
        }
    }

    let engine = ReportEngine::new();
    let report = engine.build(&result);
    let rendered = engine.render(&report, format.into())?;

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered.data)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!(
                "{} findings across {} probes ({:?}), report written to {}",
                report.summary.total,
                result.total_probes,
                result.status,
                path.display()
            );
        }
        None => {
            println!("{}", String::from_utf8_lossy(&rendered.data));
        }
    }

    Ok(())
}

fn list() -> Result<()> {
    let registry = ProbeRegistry::with_builtin_probes()?;
    for category in registry.categories() {
        println!("{} ({})", category.display_name(), category);
        for info in registry.get_by_category(&category).infos() {
            println!(
                "  {:<36} {:<9} {}",
                info.name,
                info.default_severity.as_str(),
                info.description
            );
        }
        println!();
    }
    println!("{} probes", registry.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Serve { bind } => serve(config, bind).await,
        Commands::Scan {
            target,
            category,
            format,
            output,
            allow_local,
        } => scan(config, target, category, format, output, allow_local).await,
        Commands::List => list(),
    }
}
