//! Application services and use cases

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::deal::{AnomalyEvaluator, Deal, RouteHistory};
use crate::domain::price::{PriceSource, PriceStatistics};
use crate::domain::route::{NewRoute, PriceObservation, Route, RouteStore, SnapshotStore};
use crate::shared::errors::{AppError, StoreError};

/// Outcome of one ingestion cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Fetches prices for monitored routes and flags anomalous observations
pub struct PriceMonitoringService {
    routes: Arc<dyn RouteStore>,
    snapshots: Arc<dyn SnapshotStore>,
    price_source: Arc<dyn PriceSource>,
    evaluator: AnomalyEvaluator,
}

impl PriceMonitoringService {
    pub fn new(
        routes: Arc<dyn RouteStore>,
        snapshots: Arc<dyn SnapshotStore>,
        price_source: Arc<dyn PriceSource>,
        evaluator: AnomalyEvaluator,
    ) -> Self {
        Self {
            routes,
            snapshots,
            price_source,
            evaluator,
        }
    }

    /// Run one ingestion cycle over every active route.
    ///
    /// A failing route is logged and counted; the remaining routes still run
    /// and earlier successes are kept. Only failing to list the routes fails
    /// the cycle itself.
    pub async fn fetch_prices_for_all_active_routes(&self) -> Result<CycleReport, AppError> {
        let active_routes = self.routes.find_active_routes().await?;
        let mut report = CycleReport::default();

        for route in &active_routes {
            match self.fetch_and_save_price(route).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    warn!("Route error {}: {}", route.id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Finished fetching and saving flight prices, {} successful, {} failed",
            report.succeeded, report.failed
        );
        Ok(report)
    }

    /// Fetch and evaluate a single route on request.
    ///
    /// Unlike the scheduled cycle, a price source failure is returned to the caller.
    pub async fn fetch_route_price(&self, route_id: Uuid) -> Result<PriceObservation, AppError> {
        let route = self
            .routes
            .find_route(route_id)
            .await?
            .ok_or(StoreError::RouteNotFound(route_id))?;
        self.fetch_and_save_price(&route).await
    }

    async fn fetch_and_save_price(&self, route: &Route) -> Result<PriceObservation, AppError> {
        let quote = self
            .price_source
            .fetch_lowest_price(&route.origin, &route.destination, route.departure_date)
            .await?;

        let observation = PriceObservation::new(route.id, quote.price, &quote.currency, Utc::now())?;
        let mut saved = self.snapshots.save_observation(observation).await?;

        let history = self.snapshots.find_history(route.id).await?;
        if self.evaluator.evaluate_anomaly(route, &saved, &history)? && !saved.is_anomaly {
            saved.mark_anomalous();
            saved = self.snapshots.save_observation(saved).await?;
        }
        Ok(saved)
    }
}

/// Route management
pub struct RouteService {
    routes: Arc<dyn RouteStore>,
}

impl RouteService {
    pub fn new(routes: Arc<dyn RouteStore>) -> Self {
        Self { routes }
    }

    /// Start monitoring a route. An inactive route with the same identity is
    /// re-activated; an active one is a duplicate.
    pub async fn create_route(&self, request: NewRoute) -> Result<Route, AppError> {
        let request = request.validate(Utc::now().date_naive())?;

        let existing = self
            .routes
            .find_route_by_identity(&request.origin, &request.destination, request.departure_date)
            .await?;

        match existing {
            Some(route) if route.active => Err(StoreError::DuplicateRoute {
                origin: route.origin,
                destination: route.destination,
                departure_date: route.departure_date,
            }
            .into()),
            Some(mut route) => {
                info!("Re-activating route {} ({} -> {})", route.id, route.origin, route.destination);
                route.active = true;
                Ok(self.routes.save_route(route).await?)
            }
            None => {
                let route = request.into_route(Utc::now());
                info!("Monitoring new route {} ({} -> {} on {})", route.id, route.origin, route.destination, route.departure_date);
                Ok(self.routes.save_route(route).await?)
            }
        }
    }

    pub async fn list_routes(&self, active_only: bool) -> Result<Vec<Route>, AppError> {
        let routes = if active_only {
            self.routes.find_active_routes().await?
        } else {
            self.routes.find_all_routes().await?
        };
        Ok(routes)
    }

    pub async fn get_route(&self, route_id: Uuid) -> Result<Route, AppError> {
        Ok(self
            .routes
            .find_route(route_id)
            .await?
            .ok_or(StoreError::RouteNotFound(route_id))?)
    }

    pub async fn delete_route(&self, route_id: Uuid) -> Result<(), AppError> {
        self.get_route(route_id).await?;
        self.routes.delete_route(route_id).await?;
        info!("Deleted route {}", route_id);
        Ok(())
    }

    pub async fn deactivate_route(&self, route_id: Uuid) -> Result<Route, AppError> {
        let mut route = self.get_route(route_id).await?;
        route.active = false;
        info!("Deactivated route {}", route_id);
        Ok(self.routes.save_route(route).await?)
    }
}

/// Statistics of one route together with its identity
#[derive(Debug, Clone, Serialize)]
pub struct RouteStatistics {
    pub route: Route,
    pub statistics: PriceStatistics,
}

/// Read-side queries: price history, statistics and deals.
///
/// Everything is recomputed from the stores on every call.
pub struct DealService {
    routes: Arc<dyn RouteStore>,
    snapshots: Arc<dyn SnapshotStore>,
    evaluator: AnomalyEvaluator,
}

impl DealService {
    pub fn new(
        routes: Arc<dyn RouteStore>,
        snapshots: Arc<dyn SnapshotStore>,
        evaluator: AnomalyEvaluator,
    ) -> Self {
        Self {
            routes,
            snapshots,
            evaluator,
        }
    }

    pub async fn current_deals(&self) -> Result<Vec<Deal>, AppError> {
        let active_routes = self.routes.find_active_routes().await?;
        let mut entries = Vec::with_capacity(active_routes.len());
        for route in active_routes {
            let history = self.snapshots.find_history(route.id).await?;
            entries.push(RouteHistory::new(route, history));
        }
        Ok(self.evaluator.rank_deals(&entries)?)
    }

    pub async fn route_statistics(&self, route_id: Uuid) -> Result<RouteStatistics, AppError> {
        let route = self.find_route(route_id).await?;
        let history = self.snapshots.find_history(route_id).await?;
        let statistics = self.evaluator.route_statistics(&route, &history)?;
        Ok(RouteStatistics { route, statistics })
    }

    /// Observations of a route, newest first
    pub async fn snapshots_for_route(&self, route_id: Uuid) -> Result<Vec<PriceObservation>, AppError> {
        self.find_route(route_id).await?;
        let mut history = self.snapshots.find_history(route_id).await?;
        history.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));
        Ok(history)
    }

    async fn find_route(&self, route_id: Uuid) -> Result<Route, AppError> {
        Ok(self
            .routes
            .find_route(route_id)
            .await?
            .ok_or(StoreError::RouteNotFound(route_id))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{future_date, ScriptedPriceSource};
    use crate::domain::price::AnomalyThresholds;
    use crate::infrastructure::InMemoryStore;
    use crate::shared::errors::{AnalysisError, PriceSourceError};
    use chrono::Duration;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: Arc<InMemoryStore>,
        source: Arc<ScriptedPriceSource>,
        monitoring: PriceMonitoringService,
        routes: RouteService,
        deals: DealService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let source = Arc::new(ScriptedPriceSource::new());
        let evaluator = AnomalyEvaluator::new(AnomalyThresholds::default());
        Fixture {
            monitoring: PriceMonitoringService::new(store.clone(), store.clone(), source.clone(), evaluator.clone()),
            routes: RouteService::new(store.clone()),
            deals: DealService::new(store.clone(), store.clone(), evaluator),
            store,
            source,
        }
    }

    fn new_route(origin: &str) -> NewRoute {
        NewRoute {
            origin: origin.to_string(),
            destination: "BAH".to_string(),
            departure_date: future_date(),
        }
    }

    async fn seed_history(store: &InMemoryStore, route: &Route, prices: &[Decimal]) {
        let start = Utc::now() - Duration::days(30);
        for (i, price) in prices.iter().enumerate() {
            let observation =
                PriceObservation::new(route.id, *price, "EUR", start + Duration::hours(6 * i as i64)).unwrap();
            store.save_observation(observation).await.unwrap();
        }
    }

    fn history_prices() -> Vec<Decimal> {
        vec![dec!(100.00), dec!(150.00), dec!(200.00), dec!(250.00), dec!(300.00)]
    }

    #[tokio::test]
    async fn test_create_route_rejects_active_duplicate_and_reactivates() {
        let f = fixture();
        let route = f.routes.create_route(new_route("krk")).await.unwrap();
        assert_eq!(route.origin, "KRK");

        let duplicate = f.routes.create_route(new_route("KRK")).await;
        assert!(matches!(duplicate, Err(AppError::Store(StoreError::DuplicateRoute { .. }))));

        f.routes.deactivate_route(route.id).await.unwrap();
        assert!(f.routes.list_routes(true).await.unwrap().is_empty());

        let reactivated = f.routes.create_route(new_route("KRK")).await.unwrap();
        assert_eq!(reactivated.id, route.id);
        assert!(reactivated.active);
        assert_eq!(f.routes.list_routes(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_route() {
        let f = fixture();
        let missing = Uuid::new_v4();
        assert!(matches!(
            f.routes.get_route(missing).await,
            Err(AppError::Store(StoreError::RouteNotFound(_)))
        ));
        assert!(matches!(
            f.routes.delete_route(missing).await,
            Err(AppError::Store(StoreError::RouteNotFound(_)))
        ));
        assert!(matches!(
            f.deals.snapshots_for_route(missing).await,
            Err(AppError::Store(StoreError::RouteNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_cycle_flags_anomalous_observation() {
        let f = fixture();
        let route = f.routes.create_route(new_route("KRK")).await.unwrap();
        // Post-insert history [100, 100, 100, 100, 101, 20] puts 20.00 far below the mean
        seed_history(&f.store, &route, &[dec!(100.00), dec!(100.00), dec!(100.00), dec!(100.00), dec!(101.00)]).await;
        f.source.set_price("KRK", dec!(20.00));

        let report = f.monitoring.fetch_prices_for_all_active_routes().await.unwrap();
        assert_eq!(report, CycleReport { succeeded: 1, failed: 0 });

        let latest = f.store.find_latest(route.id).await.unwrap().unwrap();
        assert_eq!(latest.price, dec!(20.00));
        assert!(latest.is_anomaly);
        assert_eq!(f.store.find_history(route.id).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_cycle_skips_evaluation_with_insufficient_data() {
        let f = fixture();
        let route = f.routes.create_route(new_route("KRK")).await.unwrap();
        seed_history(&f.store, &route, &[dec!(200.00), dec!(210.00)]).await;
        f.source.set_price("KRK", dec!(20.00));

        f.monitoring.fetch_prices_for_all_active_routes().await.unwrap();

        let latest = f.store.find_latest(route.id).await.unwrap().unwrap();
        assert_eq!(latest.price, dec!(20.00));
        assert!(!latest.is_anomaly);
    }

    #[tokio::test]
    async fn test_cycle_isolates_route_failures() {
        let f = fixture();
        let good = f.routes.create_route(new_route("KRK")).await.unwrap();
        let bad = f.routes.create_route(new_route("WAW")).await.unwrap();
        let other = f.routes.create_route(new_route("GDN")).await.unwrap();
        let inactive = f.routes.create_route(new_route("POZ")).await.unwrap();
        f.routes.deactivate_route(inactive.id).await.unwrap();

        f.source.set_price("KRK", dec!(180.00));
        f.source.set_error("WAW", PriceSourceError::unavailable("timeout"));
        f.source.set_price("GDN", dec!(99.00));

        let report = f.monitoring.fetch_prices_for_all_active_routes().await.unwrap();
        assert_eq!(report, CycleReport { succeeded: 2, failed: 1 });
        assert_eq!(f.store.find_history(good.id).await.unwrap().len(), 1);
        assert!(f.store.find_history(bad.id).await.unwrap().is_empty());
        assert_eq!(f.store.find_history(other.id).await.unwrap().len(), 1);
        assert!(f.store.find_history(inactive.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_route_fetch_surfaces_source_failure() {
        let f = fixture();
        let route = f.routes.create_route(new_route("KRK")).await.unwrap();
        f.source.set_error("KRK", PriceSourceError::with_status("no flights found", 404));

        let result = f.monitoring.fetch_route_price(route.id).await;
        assert!(matches!(result, Err(AppError::PriceSource(_))));

        f.source.set_price("KRK", dec!(150.00));
        let observation = f.monitoring.fetch_route_price(route.id).await.unwrap();
        assert_eq!(observation.price, dec!(150.00));
        assert_eq!(observation.currency, "EUR");
    }

    #[tokio::test]
    async fn test_route_statistics() {
        let f = fixture();
        let route = f.routes.create_route(new_route("KRK")).await.unwrap();
        seed_history(&f.store, &route, &history_prices()[..3]).await;

        assert!(matches!(
            f.deals.route_statistics(route.id).await,
            Err(AppError::Analysis(AnalysisError::InsufficientData { actual: 3, required: 5, .. }))
        ));

        seed_history(&f.store, &route, &[dec!(250.00), dec!(300.00)]).await;
        let result = f.deals.route_statistics(route.id).await.unwrap();
        assert_eq!(result.route.id, route.id);
        assert_eq!(result.statistics.mean, dec!(200.00));
        assert_eq!(result.statistics.sample_count, 5);
    }

    #[tokio::test]
    async fn test_current_deals_ranks_active_routes() {
        let f = fixture();
        let cheap = f.routes.create_route(new_route("KRK")).await.unwrap();
        let normal = f.routes.create_route(new_route("WAW")).await.unwrap();
        let inactive = f.routes.create_route(new_route("GDN")).await.unwrap();

        let mut prices = history_prices();
        prices.push(dec!(50.00));
        seed_history(&f.store, &cheap, &prices).await;
        seed_history(&f.store, &inactive, &prices).await;
        let mut prices = history_prices();
        prices.push(dec!(195.00));
        seed_history(&f.store, &normal, &prices).await;
        f.routes.deactivate_route(inactive.id).await.unwrap();

        let deals = f.deals.current_deals().await.unwrap();
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].route_id, cheap.id);
        assert_eq!(deals[0].drop_percentage, dec!(71.4286));
    }

    #[tokio::test]
    async fn test_snapshots_newest_first() {
        let f = fixture();
        let route = f.routes.create_route(new_route("KRK")).await.unwrap();
        seed_history(&f.store, &route, &history_prices()).await;

        let snapshots = f.deals.snapshots_for_route(route.id).await.unwrap();
        assert_eq!(snapshots.len(), 5);
        assert_eq!(snapshots[0].price, dec!(300.00));
        assert_eq!(snapshots[4].price, dec!(100.00));
    }
}
