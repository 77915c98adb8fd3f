use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::Path};

use crate::domain::route::NewRoute;
use crate::infrastructure::AmadeusConfig;

pub const API_KEY_ENV: &str = "AMADEUS_API_KEY";
pub const API_SECRET_ENV: &str = "AMADEUS_API_SECRET";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerCfg {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerCfg {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyCfg {
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    #[serde(default = "default_z_score_threshold")]
    pub z_score_threshold: f64,
    #[serde(default = "default_percentage_threshold")]
    pub percentage_threshold: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerCfg,
    #[serde(default)]
    pub scheduler: SchedulerCfg,
    #[serde(default)]
    pub anomaly: AnomalyCfg,
    #[serde(default)]
    pub price_source: AmadeusConfig,
    /// Routes monitored from startup
    #[serde(default)]
    pub routes: Vec<NewRoute>,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

// six hours
fn default_interval_ms() -> u64 {
    21_600_000
}

fn default_run_on_start() -> bool {
    true
}

fn default_min_samples() -> usize {
    5
}

fn default_z_score_threshold() -> f64 {
    2.0
}

fn default_percentage_threshold() -> f64 {
    0.7
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            run_on_start: default_run_on_start(),
        }
    }
}

impl Default for AnomalyCfg {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            z_score_threshold: default_z_score_threshold(),
            percentage_threshold: default_percentage_threshold(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parse fare-watch config")?;
        Ok(cfg)
    }

    /// Fill empty API credentials from the environment
    pub fn apply_env(&mut self) {
        self.apply_credentials(env::var(API_KEY_ENV).ok(), env::var(API_SECRET_ENV).ok());
    }

    fn apply_credentials(&mut self, api_key: Option<String>, api_secret: Option<String>) {
        if self.price_source.api_key.is_empty() {
            if let Some(key) = api_key {
                self.price_source.api_key = key;
            }
        }
        if self.price_source.api_secret.is_empty() {
            if let Some(secret) = api_secret {
                self.price_source.api_secret = secret;
            }
        }
    }
}
