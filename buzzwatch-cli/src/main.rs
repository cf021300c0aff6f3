//! ## buzzwatch-cli
//! **Operational entrypoint**
//!
//! Consumes the configured topic until SIGINT/SIGTERM, replays JSON-lines
//! files through the same pipeline, or prints the resolved configuration.
//! Setup failures exit non-zero.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await
}
