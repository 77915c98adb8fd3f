//! Application layer - use cases and services

pub mod commands;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use commands::{Cli, CommandExecutor, Commands};
pub use services::{CycleReport, DealService, PriceMonitoringService, RouteService, RouteStatistics};
