//! Error handling for the application

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the statistics engine and the anomaly evaluator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not enough data for route {route_id}: {actual} samples, {required} required")]
    InsufficientData {
        route_id: Uuid,
        required: usize,
        actual: usize,
    },

    #[error("Drop percentage is undefined for a zero mean")]
    DivisionUndefined,
}

/// Price source errors
#[derive(Error, Debug, Clone)]
pub enum PriceSourceError {
    #[error("Price source unavailable: {message}")]
    SourceUnavailable {
        message: String,
        status: Option<u16>,
    },
}

impl PriceSourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        PriceSourceError::SourceUnavailable {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        PriceSourceError::SourceUnavailable {
            message: message.into(),
            status: Some(status),
        }
    }
}

impl From<reqwest::Error> for PriceSourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return PriceSourceError::unavailable(format!("request timed out: {}", err));
        }
        match err.status() {
            Some(status) => PriceSourceError::with_status(err.to_string(), status.as_u16()),
            None => PriceSourceError::unavailable(format!("transport error: {}", err)),
        }
    }
}

/// Route and snapshot store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Route not found: {0}")]
    RouteNotFound(Uuid),

    #[error("Route {origin} -> {destination} on {departure_date} is already monitored")]
    DuplicateRoute {
        origin: String,
        destination: String,
        departure_date: NaiveDate,
    },

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Invalid observation: {0}")]
    InvalidObservation(String),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    PriceSource(#[from] PriceSourceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
