//! CLI entrypoint for votemute
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod console;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use commands::Cli;
use console::{Console, StdoutNotifier};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use votemute_application::{CompositeEventSink, RandomSource};
use votemute_infrastructure::{
    ConfigLoader, FileConfig, HttpRandomSource, JsonlEventLog, LocalRandomSource,
    RandomSourceKind, TracingEventSink,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines reach the file.
    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        let config = load_config(&cli)?;
        println!();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let file_config = load_config(&cli)?;
    for issue in file_config.validate().iter().filter(|i| !i.is_error()) {
        warn!("{}", issue.message);
    }
    let engine_config = file_config.to_engine_config()?;

    info!("Starting votemute console");

    // === Dependency Injection ===
    let mut events = CompositeEventSink::new(vec![Arc::new(TracingEventSink)]);
    if !cli.quiet {
        events.push(Arc::new(StdoutNotifier));
    }
    if let Some(path) = cli.event_log.as_ref().or(file_config.logging.event_log.as_ref()) {
        let log = JsonlEventLog::open(path)
            .with_context(|| format!("cannot open event log {}", path.display()))?;
        info!(path = %log.path().display(), "Writing moderation events");
        events.push(Arc::new(log));
    }

    let random: Arc<dyn RandomSource> = match file_config.roulette.parse_source().0 {
        Some(RandomSourceKind::Local) => Arc::new(LocalRandomSource),
        _ => Arc::new(HttpRandomSource::new(
            file_config.roulette.api_url.clone(),
            Duration::from_secs(file_config.roulette.timeout_secs),
        )?),
    };

    let console = Console::new(random, Arc::new(events), engine_config);
    let mut stdout = std::io::stdout();

    match &cli.script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot open script {}", path.display()))?;
            console.run(BufReader::new(file), &mut stdout).await?;
        }
        None => {
            console
                .run(BufReader::new(tokio::io::stdin()), &mut stdout)
                .await?
        }
    }

    console.shutdown();
    Ok(())
}

fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Initialize logging based on verbosity level
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    // Console output owns stdout; diagnostics go to stderr or a file.
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    if cli.no_config {
        return Ok(ConfigLoader::load_defaults());
    }
    ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow!("failed to load configuration: {}", e))
}
