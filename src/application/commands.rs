//! CLI commands and handlers
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::app::{self, AppCfg};
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "fare-watch")]
#[command(version, about = "Flight price monitor with anomaly detection and deal ranking")]
pub struct Cli {
    /// Path to config file (optional)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// HTTP API bind address (overrides config)
    #[arg(long, global = true)]
    pub bind: Option<String>,

    /// Ingestion interval in milliseconds (overrides config)
    #[arg(long, global = true)]
    pub interval_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the ingestion scheduler and the HTTP API
    Serve {
        /// Wait for the first interval instead of fetching at startup
        #[arg(long)]
        no_initial_fetch: bool,
    },

    /// Run one ingestion cycle and print the report and current deals
    Cycle,

    /// Load and check the configuration, then exit
    ValidateConfig,
}

impl Cli {
    /// Resolve the runtime configuration, priority CLI args > config file > defaults
    pub fn app_cfg(&self) -> Result<AppCfg> {
        let mut cfg = match &self.config {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Config::from_file(path)?
            }
            None => Config::default(),
        };
        cfg.apply_env();

        if let Some(bind) = &self.bind {
            cfg.server.bind = bind.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            cfg.scheduler.interval_ms = interval_ms;
        }

        let mut app_cfg = AppCfg::from_config(cfg)?;
        if let Commands::Serve { no_initial_fetch: true } = self.command {
            app_cfg.run_on_start = false;
        }
        Ok(app_cfg)
    }
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands, app_cfg: AppCfg) -> Result<()> {
        match command {
            Commands::Serve { .. } => app::serve(app_cfg).await,
            Commands::Cycle => app::run_once(app_cfg).await,
            Commands::ValidateConfig => app::validate(&app_cfg),
        }
    }
}
