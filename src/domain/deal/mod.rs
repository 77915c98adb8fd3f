//! Deal domain - anomaly decisions and deal ranking

mod anomaly_evaluator;

pub use anomaly_evaluator::AnomalyEvaluator;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::route::{PriceObservation, Route};

/// A route whose latest price is anomalously low, recomputed on every read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deal {
    pub route_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub current_price: Decimal,
    pub average_price: Decimal,
    pub drop_percentage: Decimal,
    pub currency: String,
    pub observed_at: DateTime<Utc>,
}

/// A route together with its already-fetched price history
#[derive(Debug, Clone)]
pub struct RouteHistory {
    pub route: Route,
    pub history: Vec<PriceObservation>,
}

impl RouteHistory {
    pub fn new(route: Route, history: Vec<PriceObservation>) -> Self {
        Self { route, history }
    }
}
