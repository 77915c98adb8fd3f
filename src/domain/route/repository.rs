//! Store interfaces for routes and price observations

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::shared::errors::StoreError;
use super::{PriceObservation, Route};

/// Durable records of monitored routes
#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn find_all_routes(&self) -> Result<Vec<Route>, StoreError>;

    async fn find_active_routes(&self) -> Result<Vec<Route>, StoreError>;

    async fn find_route(&self, route_id: Uuid) -> Result<Option<Route>, StoreError>;

    async fn find_route_by_identity(
        &self,
        origin: &str,
        destination: &str,
        departure_date: NaiveDate,
    ) -> Result<Option<Route>, StoreError>;

    async fn save_route(&self, route: Route) -> Result<Route, StoreError>;

    /// Removes the route together with its observations
    async fn delete_route(&self, route_id: Uuid) -> Result<(), StoreError>;
}

/// Append-only price observations per route
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Full history of a route, in insertion order
    async fn find_history(&self, route_id: Uuid) -> Result<Vec<PriceObservation>, StoreError>;

    async fn find_latest(&self, route_id: Uuid) -> Result<Option<PriceObservation>, StoreError>;

    /// Insert a new observation or update the flag of an existing one.
    /// A flag that is already set is never cleared.
    async fn save_observation(
        &self,
        observation: PriceObservation,
    ) -> Result<PriceObservation, StoreError>;
}
