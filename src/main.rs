use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fare_watch::application::{Cli, CommandExecutor};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let app_cfg = cli.app_cfg()?;
    CommandExecutor::execute(cli.command, app_cfg).await
}
