//! Amadeus flight-offers price source

mod client;
mod dto;
mod token_provider;

pub use client::AmadeusClient;
pub use token_provider::TokenProvider;

use serde::Deserialize;

pub const TOKEN_PATH: &str = "/v1/security/oauth2/token";
pub const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";

/// Connection settings for the Amadeus API
#[derive(Debug, Clone, Deserialize)]
pub struct AmadeusConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
}

fn default_base_url() -> String {
    "https://test.api.amadeus.com".to_string()
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_min_request_interval_ms() -> u64 {
    200
}

impl Default for AmadeusConfig {
    fn default() -> Self {
        Self::new(default_base_url(), "", "")
    }
}

impl AmadeusConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            currency: default_currency(),
            timeout_ms: default_timeout_ms(),
            min_request_interval_ms: default_min_request_interval_ms(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
