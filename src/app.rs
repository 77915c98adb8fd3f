// src/app.rs
use anyhow::{anyhow, Context, Result};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::api::{self, ApiState};
use crate::application::{DealService, PriceMonitoringService, RouteService};
use crate::config::{Config, API_KEY_ENV, API_SECRET_ENV};
use crate::domain::deal::AnomalyEvaluator;
use crate::domain::price::{AnomalyThresholds, PriceSource};
use crate::domain::route::NewRoute;
use crate::infrastructure::{AmadeusClient, AmadeusConfig, InMemoryStore};
use crate::shared::errors::{AppError, StoreError};

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct AppCfg {
    pub bind: String,
    pub interval: Duration,
    pub run_on_start: bool,
    pub thresholds: AnomalyThresholds,
    pub price_source: AmadeusConfig,
    pub seed_routes: Vec<NewRoute>,
}

impl AppCfg {
    pub fn from_config(cfg: Config) -> Result<Self> {
        if cfg.scheduler.interval_ms == 0 {
            return Err(anyhow!("scheduler.interval_ms must be positive"));
        }
        let thresholds = AnomalyThresholds::new(
            cfg.anomaly.min_samples,
            cfg.anomaly.z_score_threshold,
            cfg.anomaly.percentage_threshold,
        )?;

        Ok(Self {
            bind: cfg.server.bind,
            interval: Duration::from_millis(cfg.scheduler.interval_ms),
            run_on_start: cfg.scheduler.run_on_start,
            thresholds,
            price_source: cfg.price_source,
            seed_routes: cfg.routes,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .with_context(|| format!("invalid bind address '{}'", self.bind))
    }

    /// Credentials are only needed once the price source is actually used
    pub fn ensure_credentials(&self) -> Result<()> {
        if self.price_source.api_key.is_empty() {
            return Err(anyhow!("price_source.api_key is empty and {} is not set", API_KEY_ENV));
        }
        if self.price_source.api_secret.is_empty() {
            return Err(anyhow!("price_source.api_secret is empty and {} is not set", API_SECRET_ENV));
        }
        Ok(())
    }
}

/// Services wired over a shared in-memory store
#[derive(Clone)]
pub struct App {
    pub routes: Arc<RouteService>,
    pub monitoring: Arc<PriceMonitoringService>,
    pub deals: Arc<DealService>,
}

impl App {
    pub fn new(thresholds: AnomalyThresholds, price_source: Arc<dyn PriceSource>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let evaluator = AnomalyEvaluator::new(thresholds);

        Self {
            routes: Arc::new(RouteService::new(store.clone())),
            monitoring: Arc::new(PriceMonitoringService::new(
                store.clone(),
                store.clone(),
                price_source,
                evaluator.clone(),
            )),
            deals: Arc::new(DealService::new(store.clone(), store, evaluator)),
        }
    }

    pub fn api_state(&self) -> ApiState {
        ApiState {
            routes: self.routes.clone(),
            monitoring: self.monitoring.clone(),
            deals: self.deals.clone(),
        }
    }

    /// Register the configured routes; returns how many are now monitored.
    /// Invalid entries are skipped with a warning.
    pub async fn seed_routes(&self, routes: &[NewRoute]) -> usize {
        let mut seeded = 0;
        for request in routes {
            match self.routes.create_route(request.clone()).await {
                Ok(route) => {
                    info!("✅ Seeded route {} -> {} on {}", route.origin, route.destination, route.departure_date);
                    seeded += 1;
                }
                Err(AppError::Store(StoreError::DuplicateRoute { .. })) => {
                    debug!("Seed route {} -> {} already monitored", request.origin, request.destination);
                }
                Err(e) => warn!("❌ Skipping seed route {} -> {}: {}", request.origin, request.destination, e),
            }
        }
        seeded
    }
}

fn amadeus_source(app_cfg: &AppCfg) -> Result<Arc<dyn PriceSource>> {
    app_cfg.ensure_credentials()?;
    let client = AmadeusClient::new(app_cfg.price_source.clone())?;
    Ok(Arc::new(client))
}

/// Run the scheduler and the HTTP API until ctrl-c
pub async fn serve(app_cfg: AppCfg) -> Result<()> {
    info!("Starting fare-watch");
    let addr = app_cfg.bind_addr()?;
    let app = App::new(app_cfg.thresholds.clone(), amadeus_source(&app_cfg)?);
    app.seed_routes(&app_cfg.seed_routes).await;

    let scheduler = tokio::spawn(run_scheduler(
        app.monitoring.clone(),
        app_cfg.interval,
        app_cfg.run_on_start,
    ));

    info!("HTTP API listening on {}", addr);
    let server = axum::Server::try_bind(&addr)
        .with_context(|| format!("bind {}", addr))?
        .serve(api::router(app.api_state()).into_make_service())
        .with_graceful_shutdown(shutdown_signal());

    let result = server.await.context("HTTP server failed");
    scheduler.abort();
    info!("Stopped fare-watch");
    result
}

/// Seed routes, run a single ingestion cycle and print the report with the
/// current deals as JSON
pub async fn run_once(app_cfg: AppCfg) -> Result<()> {
    let app = App::new(app_cfg.thresholds.clone(), amadeus_source(&app_cfg)?);
    app.seed_routes(&app_cfg.seed_routes).await;

    let report = app.monitoring.fetch_prices_for_all_active_routes().await?;
    let deals = app.deals.current_deals().await?;

    let output = json!({ "report": report, "deals": deals });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Check the configuration without contacting the price source
pub fn validate(app_cfg: &AppCfg) -> Result<()> {
    app_cfg.bind_addr()?;
    let today = chrono::Utc::now().date_naive();
    for request in &app_cfg.seed_routes {
        request
            .clone()
            .validate(today)
            .with_context(|| format!("seed route {} -> {}", request.origin, request.destination))?;
    }
    if let Err(e) = app_cfg.ensure_credentials() {
        warn!("{}", e);
    }

    info!("Configuration is valid");
    info!("  bind: {}", app_cfg.bind);
    info!("  interval: {:?} (run on start: {})", app_cfg.interval, app_cfg.run_on_start);
    info!(
        "  anomaly: min_samples={}, z_score_threshold={}, percentage_threshold={}",
        app_cfg.thresholds.min_samples,
        app_cfg.thresholds.z_score_threshold,
        app_cfg.thresholds.percentage_threshold
    );
    info!("  price source: {} ({})", app_cfg.price_source.base_url, app_cfg.price_source.currency);
    info!("  seed routes: {}", app_cfg.seed_routes.len());
    Ok(())
}

/// Run one ingestion cycle per tick. A failed cycle is logged and the next tick still runs.
pub async fn run_scheduler(monitoring: Arc<PriceMonitoringService>, period: Duration, run_on_start: bool) {
    info!("Scheduling price ingestion every {:?}", period);

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    if !run_on_start {
        // the first tick completes immediately
        interval.tick().await;
    }

    loop {
        interval.tick().await;

        info!("Fetching prices for active routes...");
        if let Err(e) = monitoring.fetch_prices_for_all_active_routes().await {
            error!("Ingestion cycle failed: {}", e);
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
