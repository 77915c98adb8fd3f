//! HTTP API over the route, monitoring and deal services

mod error;
mod handlers;

pub use error::{ApiError, ErrorResponse};

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::application::{DealService, PriceMonitoringService, RouteService};

#[derive(Clone)]
pub struct ApiState {
    pub routes: Arc<RouteService>,
    pub monitoring: Arc<PriceMonitoringService>,
    pub deals: Arc<DealService>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/routes", post(handlers::create_route).get(handlers::list_routes))
        .route("/routes/:id", get(handlers::get_route).delete(handlers::delete_route))
        .route("/routes/:id/deactivate", post(handlers::deactivate_route))
        .route("/routes/:id/prices", get(handlers::route_prices))
        .route("/routes/:id/statistics", get(handlers::route_statistics))
        .route("/routes/:id/fetch", post(handlers::fetch_route_price))
        .route("/deals", get(handlers::deals))
        .with_state(state)
}
