//! In-memory route and snapshot store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::route::{latest_observation, PriceObservation, Route, RouteStore, SnapshotStore};
use crate::shared::errors::StoreError;

/// Keeps routes and their observations in process memory.
///
/// Clones share the same underlying maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    routes: Arc<RwLock<HashMap<Uuid, Route>>>,
    snapshots: Arc<RwLock<HashMap<Uuid, Vec<PriceObservation>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RouteStore for InMemoryStore {
    async fn find_all_routes(&self) -> Result<Vec<Route>, StoreError> {
        let routes = self.routes.read().await;
        let mut all: Vec<Route> = routes.values().cloned().collect();
        all.sort_by_key(|route| route.created_at);
        Ok(all)
    }

    async fn find_active_routes(&self) -> Result<Vec<Route>, StoreError> {
        let all = self.find_all_routes().await?;
        Ok(all.into_iter().filter(|route| route.active).collect())
    }

    async fn find_route(&self, route_id: Uuid) -> Result<Option<Route>, StoreError> {
        Ok(self.routes.read().await.get(&route_id).cloned())
    }

    async fn find_route_by_identity(
        &self,
        origin: &str,
        destination: &str,
        departure_date: NaiveDate,
    ) -> Result<Option<Route>, StoreError> {
        let routes = self.routes.read().await;
        Ok(routes
            .values()
            .find(|route| {
                route.origin == origin
                    && route.destination == destination
                    && route.departure_date == departure_date
            })
            .cloned())
    }

    async fn save_route(&self, route: Route) -> Result<Route, StoreError> {
        self.routes.write().await.insert(route.id, route.clone());
        Ok(route)
    }

    // Lock order everywhere: routes, then snapshots
    async fn delete_route(&self, route_id: Uuid) -> Result<(), StoreError> {
        let mut routes = self.routes.write().await;
        if routes.remove(&route_id).is_none() {
            return Err(StoreError::RouteNotFound(route_id));
        }
        self.snapshots.write().await.remove(&route_id);
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn find_history(&self, route_id: Uuid) -> Result<Vec<PriceObservation>, StoreError> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(&route_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_latest(&self, route_id: Uuid) -> Result<Option<PriceObservation>, StoreError> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .get(&route_id)
            .and_then(|history| latest_observation(history))
            .cloned())
    }

    async fn save_observation(
        &self,
        observation: PriceObservation,
    ) -> Result<PriceObservation, StoreError> {
        // held until the insert is done so a concurrent delete cannot orphan it
        let routes = self.routes.read().await;
        if !routes.contains_key(&observation.route_id) {
            return Err(StoreError::RouteNotFound(observation.route_id));
        }

        let mut snapshots = self.snapshots.write().await;
        let history = snapshots.entry(observation.route_id).or_default();

        match history.iter().position(|stored| stored.id == observation.id) {
            Some(index) => {
                if observation.is_anomaly {
                    history[index].mark_anomalous();
                }
                Ok(history[index].clone())
            }
            None => {
                history.push(observation.clone());
                Ok(observation)
            }
        }
    }
}
