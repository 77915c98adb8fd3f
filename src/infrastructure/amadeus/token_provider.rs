//! OAuth2 client-credentials token with expiry-aware caching

use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::shared::errors::PriceSourceError;
use super::dto::TokenResponse;
use super::{AmadeusConfig, TOKEN_PATH};

/// Tokens are refreshed this long before they actually expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Fetches and caches the bearer token for the Amadeus API.
///
/// A failed fetch is never cached, the next call tries again.
pub struct TokenProvider {
    http_client: Client,
    config: AmadeusConfig,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(http_client: Client, config: AmadeusConfig) -> Self {
        Self {
            http_client,
            config,
            cached: Mutex::new(None),
        }
    }

    pub async fn get_token(&self) -> Result<String, PriceSourceError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
            debug!("Cached Amadeus token expired, refreshing");
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<CachedToken, PriceSourceError> {
        let response = self
            .http_client
            .post(self.config.url(TOKEN_PATH))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.api_key.as_str()),
                ("client_secret", self.config.api_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PriceSourceError::with_status(
                format!("fetching token failed: {}", body),
                status.as_u16(),
            ));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        info!("🔑 Obtained Amadeus access token, valid for {}s", lifetime.as_secs());

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}
