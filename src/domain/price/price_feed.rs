//! Price source interface

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::shared::errors::PriceSourceError;
use super::QuotedPrice;

/// External service returning the current lowest fare for a route
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_lowest_price(
        &self,
        origin: &str,
        destination: &str,
        departure_date: NaiveDate,
    ) -> Result<QuotedPrice, PriceSourceError>;
}
