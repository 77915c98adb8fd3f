//! Request handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::application::RouteStatistics;
use crate::domain::deal::Deal;
use crate::domain::route::{NewRoute, PriceObservation, Route};
use super::error::ApiError;
use super::ApiState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ListRoutesQuery {
    #[serde(default)]
    pub active: bool,
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn create_route(
    State(state): State<ApiState>,
    Json(request): Json<NewRoute>,
) -> ApiResult<(StatusCode, Json<Route>)> {
    let route = state.routes.create_route(request).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

pub async fn list_routes(
    State(state): State<ApiState>,
    Query(query): Query<ListRoutesQuery>,
) -> ApiResult<Json<Vec<Route>>> {
    Ok(Json(state.routes.list_routes(query.active).await?))
}

pub async fn get_route(State(state): State<ApiState>, Path(route_id): Path<Uuid>) -> ApiResult<Json<Route>> {
    Ok(Json(state.routes.get_route(route_id).await?))
}

pub async fn delete_route(State(state): State<ApiState>, Path(route_id): Path<Uuid>) -> ApiResult<StatusCode> {
    state.routes.delete_route(route_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn deactivate_route(
    State(state): State<ApiState>,
    Path(route_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.routes.deactivate_route(route_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn route_prices(
    State(state): State<ApiState>,
    Path(route_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PriceObservation>>> {
    Ok(Json(state.deals.snapshots_for_route(route_id).await?))
}

pub async fn route_statistics(
    State(state): State<ApiState>,
    Path(route_id): Path<Uuid>,
) -> ApiResult<Json<RouteStatistics>> {
    Ok(Json(state.deals.route_statistics(route_id).await?))
}

/// Fetch and evaluate one route right away
pub async fn fetch_route_price(
    State(state): State<ApiState>,
    Path(route_id): Path<Uuid>,
) -> ApiResult<Json<PriceObservation>> {
    Ok(Json(state.monitoring.fetch_route_price(route_id).await?))
}

pub async fn deals(State(state): State<ApiState>) -> ApiResult<Json<Vec<Deal>>> {
    Ok(Json(state.deals.current_deals().await?))
}
