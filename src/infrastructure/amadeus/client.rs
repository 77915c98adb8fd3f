//! Flight-offers search returning the lowest fare for a route

use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::price::{PriceSource, QuotedPrice};
use crate::shared::errors::PriceSourceError;
use super::dto::FlightOffersResponse;
use super::{AmadeusConfig, TokenProvider, FLIGHT_OFFERS_PATH};

/// Amadeus API client
pub struct AmadeusClient {
    http_client: Client,
    config: AmadeusConfig,
    token_provider: TokenProvider,
    last_request: Mutex<Option<Instant>>,
}

impl AmadeusClient {
    pub fn new(config: AmadeusConfig) -> Result<Self, PriceSourceError> {
        let http_client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let token_provider = TokenProvider::new(http_client.clone(), config.clone());

        Ok(Self {
            http_client,
            config,
            token_provider,
            last_request: Mutex::new(None),
        })
    }

    /// Space requests by `min_request_interval_ms` to stay under the upstream rate limit
    async fn throttle(&self) {
        let spacing = Duration::from_millis(self.config.min_request_interval_ms);
        let mut last_request = self.last_request.lock().await;
        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < spacing {
                tokio::time::sleep(spacing - elapsed).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

#[async_trait]
impl PriceSource for AmadeusClient {
    async fn fetch_lowest_price(
        &self,
        origin: &str,
        destination: &str,
        departure_date: NaiveDate,
    ) -> Result<QuotedPrice, PriceSourceError> {
        let token = self.token_provider.get_token().await?;
        self.throttle().await;

        let departure = departure_date.format("%Y-%m-%d").to_string();
        debug!("Searching flight offers {} -> {} on {}", origin, destination, departure);

        let response = self
            .http_client
            .get(self.config.url(FLIGHT_OFFERS_PATH))
            .query(&[
                ("originLocationCode", origin),
                ("destinationLocationCode", destination),
                ("departureDate", departure.as_str()),
                ("adults", "1"),
                ("nonStop", "false"),
                ("max", "1"),
                ("currencyCode", self.config.currency.as_str()),
            ])
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PriceSourceError::with_status(
                format!("fetching offer failed: {}", body),
                status.as_u16(),
            ));
        }

        let offers: FlightOffersResponse = response.json().await?;
        let mut quotes = Vec::with_capacity(offers.data.len());
        for offer in offers.data {
            let price = Decimal::from_str(&offer.price.grand_total).map_err(|e| {
                PriceSourceError::unavailable(format!(
                    "unparseable offer price '{}': {}",
                    offer.price.grand_total, e
                ))
            })?;
            quotes.push(QuotedPrice {
                price,
                currency: offer.price.currency,
            });
        }

        let lowest = quotes
            .into_iter()
            .min_by(|a, b| a.price.cmp(&b.price))
            .ok_or_else(|| PriceSourceError::with_status("no flights found for given criteria", 404))?;

        info!("Found lowest price: {} {}", lowest.price, lowest.currency);
        Ok(lowest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::amadeus::TOKEN_PATH;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Form, Json, Router};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct MockState {
        token_calls: Arc<AtomicUsize>,
        offers: Value,
        offers_status: StatusCode,
    }

    async fn token(
        State(state): State<MockState>,
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        state.token_calls.fetch_add(1, Ordering::SeqCst);
        if form.get("client_secret").map(String::as_str) != Some("secret") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_client"})));
        }
        (
            StatusCode::OK,
            Json(json!({"access_token": "abc123", "token_type": "Bearer", "expires_in": 1799})),
        )
    }

    async fn offers(
        State(state): State<MockState>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let authorized = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            == Some("Bearer abc123");
        if !authorized || query.get("originLocationCode").is_none() {
            return (StatusCode::BAD_REQUEST, Json(json!({"errors": []})));
        }
        (state.offers_status, Json(state.offers.clone()))
    }

    async fn spawn_mock(offers_body: Value, offers_status: StatusCode) -> (String, Arc<AtomicUsize>) {
        let token_calls = Arc::new(AtomicUsize::new(0));
        let state = MockState {
            token_calls: token_calls.clone(),
            offers: offers_body,
            offers_status,
        };
        let app = Router::new()
            .route(TOKEN_PATH, post(token))
            .route(FLIGHT_OFFERS_PATH, get(offers))
            .with_state(state);

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = axum::Server::from_tcp(listener).unwrap().serve(app.into_make_service());
        tokio::spawn(server);
        (format!("http://{}", addr), token_calls)
    }

    fn client(base_url: &str, secret: &str) -> AmadeusClient {
        let mut config = AmadeusConfig::new(base_url, "key", secret);
        config.min_request_interval_ms = 0;
        AmadeusClient::new(config).unwrap()
    }

    fn departure() -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 1, 15).unwrap()
    }

    #[tokio::test]
    async fn test_lowest_price_and_token_caching() {
        let body = json!({"data": [
            {"price": {"currency": "EUR", "total": "240.10", "grandTotal": "251.30"}},
            {"price": {"currency": "EUR", "total": "199.00", "grandTotal": "199.99"}}
        ]});
        let (base_url, token_calls) = spawn_mock(body, StatusCode::OK).await;
        let client = client(&base_url, "secret");

        let quote = client.fetch_lowest_price("KRK", "BAH", departure()).await.unwrap();
        assert_eq!(quote.price, dec!(199.99));
        assert_eq!(quote.currency, "EUR");

        client.fetch_lowest_price("KRK", "BAH", departure()).await.unwrap();
        assert_eq!(token_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_offers_is_unavailable() {
        let (base_url, _) = spawn_mock(json!({"data": []}), StatusCode::OK).await;
        let result = client(&base_url, "secret")
            .fetch_lowest_price("KRK", "BAH", departure())
            .await;
        assert!(matches!(
            result,
            Err(PriceSourceError::SourceUnavailable { status: Some(404), .. })
        ));
    }

    #[tokio::test]
    async fn test_upstream_error_is_unavailable() {
        let (base_url, _) = spawn_mock(json!({"errors": []}), StatusCode::INTERNAL_SERVER_ERROR).await;
        let result = client(&base_url, "secret")
            .fetch_lowest_price("KRK", "BAH", departure())
            .await;
        assert!(matches!(
            result,
            Err(PriceSourceError::SourceUnavailable { status: Some(500), .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_token_is_not_cached() {
        let (base_url, token_calls) = spawn_mock(json!({"data": []}), StatusCode::OK).await;
        let client = client(&base_url, "wrong");

        for _ in 0..2 {
            let result = client.fetch_lowest_price("KRK", "BAH", departure()).await;
            assert!(matches!(
                result,
                Err(PriceSourceError::SourceUnavailable { status: Some(401), .. })
            ));
        }
        assert_eq!(token_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_source() {
        let result = client("http://127.0.0.1:9", "secret")
            .fetch_lowest_price("KRK", "BAH", departure())
            .await;
        assert!(matches!(result, Err(PriceSourceError::SourceUnavailable { .. })));
    }
}
