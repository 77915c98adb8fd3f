//! Anomaly criteria over computed statistics

use rust_decimal::Decimal;

use crate::shared::errors::AnalysisError;
use crate::shared::utils::round_half_up;
use super::price_statistics::DEVIATION_SCALE;

/// A z-score counts as anomalous only when strictly below `-threshold`.
/// Price spikes and flat histories (absent z-score) never count.
pub fn is_anomaly_by_z_score(z_score: Option<Decimal>, threshold: Decimal) -> bool {
    match z_score {
        Some(z) => z < -threshold,
        None => false,
    }
}

/// The single percentage criterion: `price <= reference * threshold`.
///
/// Every other phrasing of the percentage test goes through this function.
pub fn is_anomaly_by_percentage(price: Decimal, reference: Decimal, threshold: Decimal) -> bool {
    price <= reference * threshold
}

/// Drop-phrased percentage test: has `current_price` fallen by at least
/// `(1 - threshold) * 100` percent below `mean`?
///
/// Decided on the raw prices through the ratio test, never on the rounded
/// output of [`drop_percentage`], so the two phrasings cannot drift apart.
pub fn exceeds_drop_threshold(mean: Decimal, current_price: Decimal, threshold: Decimal) -> bool {
    is_anomaly_by_percentage(current_price, mean, threshold)
}

/// Percentage decrease of `current_price` relative to `mean`, 4 decimal places.
pub fn drop_percentage(mean: Decimal, current_price: Decimal) -> Result<Decimal, AnalysisError> {
    if mean.is_zero() {
        return Err(AnalysisError::DivisionUndefined);
    }
    let drop = (mean - current_price) * Decimal::ONE_HUNDRED / mean;
    Ok(round_half_up(drop, DEVIATION_SCALE))
}
