//! Route domain - monitored routes and their price observations

mod repository;

pub use repository::{RouteStore, SnapshotStore};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::errors::StoreError;
use crate::shared::utils::{is_three_letter_code, normalize_code};

/// A monitored (origin, destination, departure date) tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Request to start monitoring a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoute {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
}

impl NewRoute {
    /// Upper-case the location codes and check them against `today`
    pub fn validate(self, today: NaiveDate) -> Result<NewRoute, StoreError> {
        let origin = normalize_code(&self.origin);
        let destination = normalize_code(&self.destination);

        if !is_three_letter_code(&origin) {
            return Err(StoreError::InvalidRoute(format!(
                "origin must be a 3-letter code, got '{}'",
                self.origin
            )));
        }
        if !is_three_letter_code(&destination) {
            return Err(StoreError::InvalidRoute(format!(
                "destination must be a 3-letter code, got '{}'",
                self.destination
            )));
        }
        if origin == destination {
            return Err(StoreError::InvalidRoute(
                "origin and destination must differ".to_string(),
            ));
        }
        if self.departure_date <= today {
            return Err(StoreError::InvalidRoute(format!(
                "departure date {} must be in the future",
                self.departure_date
            )));
        }

        Ok(NewRoute {
            origin,
            destination,
            departure_date: self.departure_date,
        })
    }

    pub fn into_route(self, now: DateTime<Utc>) -> Route {
        Route {
            id: Uuid::new_v4(),
            origin: self.origin,
            destination: self.destination,
            departure_date: self.departure_date,
            active: true,
            created_at: now,
        }
    }
}

/// One timestamped price reading for a route.
///
/// `is_anomaly` is set at most once and never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub id: Uuid,
    pub route_id: Uuid,
    pub price: Decimal,
    pub currency: String,
    pub observed_at: DateTime<Utc>,
    pub is_anomaly: bool,
}

impl PriceObservation {
    /// New, not yet evaluated observation
    pub fn new(
        route_id: Uuid,
        price: Decimal,
        currency: &str,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        if price <= Decimal::ZERO {
            return Err(StoreError::InvalidObservation(format!(
                "price must be positive, got {}",
                price
            )));
        }
        let currency = normalize_code(currency);
        if !is_three_letter_code(&currency) {
            return Err(StoreError::InvalidObservation(format!(
                "incorrect currency code '{}'",
                currency
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            route_id,
            price,
            currency,
            observed_at,
            is_anomaly: false,
        })
    }

    /// Set the anomaly flag. There is no way back to `false`.
    pub fn mark_anomalous(&mut self) {
        self.is_anomaly = true;
    }
}

/// The most recent observation of a series, if any
pub fn latest_observation(history: &[PriceObservation]) -> Option<&PriceObservation> {
    history.iter().max_by_key(|observation| observation.observed_at)
}
