//! Price domain - statistics engine, anomaly criteria and the price source port

mod price_analyzer;
mod price_feed;
mod price_statistics;

pub use price_analyzer::{
    drop_percentage, exceeds_drop_threshold, is_anomaly_by_percentage, is_anomaly_by_z_score,
};
pub use price_feed::PriceSource;
pub use price_statistics::{compute_statistics, PriceStatistics, DEVIATION_SCALE, PRICE_SCALE};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::errors::AppError;
use crate::shared::utils::decimal_from_f64;

/// Lowest price quoted by a price source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedPrice {
    pub price: Decimal,
    pub currency: String,
}

/// Thresholds driving the anomaly and deal decisions.
///
/// Immutable for the duration of an evaluation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyThresholds {
    pub min_samples: usize,
    pub z_score_threshold: Decimal,
    pub percentage_threshold: Decimal,
}

impl AnomalyThresholds {
    /// Validate configured values: `min_samples >= 1`, `z_score_threshold > 0`
    /// and `percentage_threshold` strictly between 0 and 1.
    pub fn new(
        min_samples: usize,
        z_score_threshold: f64,
        percentage_threshold: f64,
    ) -> Result<Self, AppError> {
        if min_samples < 1 {
            return Err(AppError::Config("min_samples must be at least 1".to_string()));
        }
        let z_score_threshold = decimal_from_f64(z_score_threshold)
            .filter(|z| *z > Decimal::ZERO)
            .ok_or_else(|| {
                AppError::Config(format!(
                    "z_score_threshold must be a positive number, got {}",
                    z_score_threshold
                ))
            })?;
        let percentage_threshold = decimal_from_f64(percentage_threshold)
            .filter(|p| *p > Decimal::ZERO && *p < Decimal::ONE)
            .ok_or_else(|| {
                AppError::Config(format!(
                    "percentage_threshold must be in (0, 1), got {}",
                    percentage_threshold
                ))
            })?;

        Ok(Self {
            min_samples,
            z_score_threshold,
            percentage_threshold,
        })
    }
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            min_samples: 5,
            z_score_threshold: Decimal::TWO,
            percentage_threshold: Decimal::new(7, 1),
        }
    }
}
