//! Weir - Declarative stream processing
//!
//! # Usage
//!
//! ```bash
//! # Run a topology
//! weir --config pipeline.yaml
//!
//! # Inspect the registries
//! weir --list-inputs
//! weir --list-processors
//! ```
//!
//! Exit codes: 0 on clean shutdown, 1 on configuration errors, 2 on fatal
//! runtime errors.

mod catalogue;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use weir_config::{Config, LogFormat};
use weir_engine::Stream;
use weir_metrics::{LocalSink, Metrics, NullSink, TracingSink};

/// Declarative stream processing with at-least-once delivery
#[derive(Parser, Debug)]
#[command(name = "weir")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the topology document (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print the catalogue of registered inputs and exit
    #[arg(long)]
    list_inputs: bool,

    /// Print the catalogue of registered outputs and exit
    #[arg(long)]
    list_outputs: bool,

    /// Print the catalogue of registered processors and exit
    #[arg(long)]
    list_processors: bool,

    /// Print the catalogue of registered conditions and exit
    #[arg(long)]
    list_conditions: bool,

    /// Print the catalogue of registered buffers and exit
    #[arg(long)]
    list_buffers: bool,

    /// Print the catalogue of registered caches and exit
    #[arg(long)]
    list_caches: bool,

    /// Print the catalogue of registered rate limits and exit
    #[arg(long)]
    list_rate_limits: bool,
}

impl Cli {
    fn wants_catalogue(&self) -> bool {
        self.list_inputs
            || self.list_outputs
            || self.list_processors
            || self.list_conditions
            || self.list_buffers
            || self.list_caches
            || self.list_rate_limits
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.wants_catalogue() {
        catalogue::print(&cli);
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err:#}");
            return ExitCode::from(1);
        }
    };

    if let Err(err) = init_logging(&cli, &config) {
        eprintln!("logging error: {err:#}");
        return ExitCode::from(1);
    }

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "stream failed");
            ExitCode::from(2)
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Ok(Config::from_file(path)?),
        None => Ok(Config::default()),
    }
}

/// Initialize the tracing subscriber from config, with the CLI flag taking
/// precedence
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(config.logger.level.as_str());
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| anyhow::anyhow!("invalid log level: {err}"))?;

    match config.logger.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    }
    Ok(())
}

fn run(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (metrics, local) = build_metrics(&config);
        let stream = Stream::build(&config, metrics).map_err(anyhow::Error::from)?;

        stream.run(wait_for_shutdown()).await?;

        if let Some(local) = local {
            for (path, value) in local.snapshot() {
                tracing::info!(metric = %path, value, "final counter");
            }
        }
        Ok(())
    })
}

fn build_metrics(config: &Config) -> (Metrics, Option<Arc<LocalSink>>) {
    match config.metrics.kind.as_str() {
        "logger" => (Metrics::new(Arc::new(TracingSink)), None),
        "local" => {
            let sink = Arc::new(LocalSink::new());
            (Metrics::new(sink.clone()), Some(sink))
        }
        _ => (Metrics::new(Arc::new(NullSink)), None),
    }
}

/// Resolve on SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available; park forever and rely on the
            // process being killed externally
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(signal) => signal,
            Err(_) => {
                ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
