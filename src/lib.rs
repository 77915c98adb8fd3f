//! fare-watch - flight price monitor
//! Built with Domain-Driven Design principles

pub mod api;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use application::{DealService, PriceMonitoringService, RouteService};
pub use domain::deal::{AnomalyEvaluator, Deal};
pub use domain::price::{compute_statistics, AnomalyThresholds, PriceSource, PriceStatistics};
pub use infrastructure::{AmadeusClient, InMemoryStore};
