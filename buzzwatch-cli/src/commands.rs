use std::path::PathBuf;

use anyhow::Context;
use buzzwatch_config::BuzzConfig;
use buzzwatch_engine::{ConsumerRuntime, ShutdownSignal};
use buzzwatch_telemetry::EventLogger;
use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "buzzwatch", version, about)]
pub struct Cli {
    /// YAML configuration file; defaults to config/buzzwatch.yaml plus the
    /// environment overlay.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Consume the configured Kafka topic until interrupted
    Run,
    /// Push a JSON-lines file through the pipeline instead of Kafka
    Replay(ReplayArgs),
    /// Print the resolved configuration as YAML
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// One JSON payload per line
    #[arg(short, long)]
    pub file: PathBuf,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<BuzzConfig> {
    let config = match path {
        Some(path) => BuzzConfig::load_from_path(path),
        None => BuzzConfig::load(),
    };
    config.context("Failed to load configuration")
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;

    if let Commands::Config = cli.command {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let _log_guard = EventLogger::init(&config.telemetry).context("Failed to initialize logging")?;
    let runtime = ConsumerRuntime::new(config);
    tokio::spawn(shutdown_on_signal(runtime.shutdown_signal()));

    let summary = match cli.command {
        Commands::Replay(args) => runtime.run_replay(args.file).await?,
        _ => runtime.run_kafka().await?,
    };
    if let Some(error) = &summary.transport_error {
        warn!("Run ended after a transport failure: {error}");
    }
    Ok(())
}

/// Exit status used when a second signal cuts draining short.
const FORCED_EXIT_CODE: i32 = 130;

/// Trigger `shutdown` on the first Ctrl+C or SIGTERM; exit on the second.
async fn shutdown_on_signal(shutdown: ShutdownSignal) {
    loop {
        let name = wait_for_signal().await;
        if escalate(&shutdown) {
            warn!("Received {name} while draining, exiting immediately");
            std::process::exit(FORCED_EXIT_CODE);
        }
        info!("Received {name}, draining. Send again to exit immediately");
    }
}

/// First signal requests a drain; any later one means force exit.
fn escalate(shutdown: &ShutdownSignal) -> bool {
    if shutdown.is_triggered() {
        return true;
    }
    shutdown.trigger();
    false
}

async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    }
}
