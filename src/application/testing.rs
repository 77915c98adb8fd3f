//! Test doubles shared by the service and API tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::price::{PriceSource, QuotedPrice};
use crate::shared::errors::PriceSourceError;

/// Price source answering from a per-origin script
#[derive(Default)]
pub struct ScriptedPriceSource {
    responses: Mutex<HashMap<String, Result<QuotedPrice, PriceSourceError>>>,
}

impl ScriptedPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, origin: &str, price: Decimal) {
        let quote = QuotedPrice {
            price,
            currency: "EUR".to_string(),
        };
        self.responses.lock().unwrap().insert(origin.to_string(), Ok(quote));
    }

    pub fn set_error(&self, origin: &str, error: PriceSourceError) {
        self.responses.lock().unwrap().insert(origin.to_string(), Err(error));
    }
}

#[async_trait]
impl PriceSource for ScriptedPriceSource {
    async fn fetch_lowest_price(
        &self,
        origin: &str,
        _destination: &str,
        _departure_date: NaiveDate,
    ) -> Result<QuotedPrice, PriceSourceError> {
        self.responses
            .lock()
            .unwrap()
            .get(origin)
            .cloned()
            .unwrap_or_else(|| Err(PriceSourceError::unavailable(format!("no script for {}", origin))))
    }
}

pub fn future_date() -> NaiveDate {
    (Utc::now() + Duration::days(60)).date_naive()
}
