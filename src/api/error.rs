//! Mapping of application errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::shared::errors::{AnalysisError, AppError, StoreError};

/// Body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::Store(StoreError::RouteNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::DuplicateRoute { .. }) => StatusCode::CONFLICT,
            AppError::Store(StoreError::InvalidRoute(_))
            | AppError::Store(StoreError::InvalidObservation(_)) => StatusCode::BAD_REQUEST,

            AppError::Analysis(AnalysisError::InsufficientData { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Analysis(AnalysisError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Analysis(AnalysisError::DivisionUndefined) => StatusCode::INTERNAL_SERVER_ERROR,

            AppError::PriceSource(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = ErrorResponse {
            status: status.as_u16(),
            message: self.0.to_string(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}
