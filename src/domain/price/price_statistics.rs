//! Descriptive statistics over a price series

use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;

use crate::shared::errors::AnalysisError;
use crate::shared::utils::round_half_up;

/// Scale of price-valued aggregates (mean, median)
pub const PRICE_SCALE: u32 = 2;
/// Scale of standard deviation and z-score
pub const DEVIATION_SCALE: u32 = 4;

/// Statistics of a route's price history against a current price.
///
/// Computed on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceStatistics {
    pub mean: Decimal,
    pub median: Decimal,
    pub standard_deviation: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub sample_count: usize,
    pub current_price: Decimal,
    pub z_score: Option<Decimal>,
}

/// Compute statistics of `historical_prices` and the z-score of `current_price`.
///
/// Fails with `InvalidInput` on an empty series or any negative price.
pub fn compute_statistics(
    historical_prices: &[Decimal],
    current_price: Decimal,
) -> Result<PriceStatistics, AnalysisError> {
    if historical_prices.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "price series can't be empty".to_string(),
        ));
    }
    if let Some(negative) = historical_prices.iter().find(|p| **p < Decimal::ZERO) {
        return Err(AnalysisError::InvalidInput(format!(
            "price series contains a negative price: {}",
            negative
        )));
    }
    if current_price < Decimal::ZERO {
        return Err(AnalysisError::InvalidInput(format!(
            "current price can't be negative: {}",
            current_price
        )));
    }

    let mean = mean(historical_prices);
    let median = median(historical_prices);
    let standard_deviation = standard_deviation(historical_prices, mean)?;
    // Non-empty was checked above
    let min = historical_prices.iter().copied().min().unwrap_or(Decimal::ZERO);
    let max = historical_prices.iter().copied().max().unwrap_or(Decimal::ZERO);
    let z_score = z_score(current_price, mean, standard_deviation);

    Ok(PriceStatistics {
        mean,
        median,
        standard_deviation,
        min,
        max,
        sample_count: historical_prices.len(),
        current_price,
        z_score,
    })
}

fn mean(prices: &[Decimal]) -> Decimal {
    let sum: Decimal = prices.iter().sum();
    round_half_up(sum / Decimal::from(prices.len()), PRICE_SCALE)
}

fn median(prices: &[Decimal]) -> Decimal {
    let mut sorted = prices.to_vec();
    sorted.sort();
    let n = sorted.len();
    let middle = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / Decimal::TWO
    } else {
        sorted[n / 2]
    };
    round_half_up(middle, PRICE_SCALE)
}

/// Population standard deviation around the already-rounded `mean`.
///
/// The sum of squares and the square root run at full decimal precision;
/// only the result is rounded.
fn standard_deviation(prices: &[Decimal], mean: Decimal) -> Result<Decimal, AnalysisError> {
    if prices.len() == 1 {
        return Ok(Decimal::ZERO);
    }
    let sum_of_squares: Decimal = prices
        .iter()
        .map(|price| {
            let diff = *price - mean;
            diff * diff
        })
        .sum();
    let variance = sum_of_squares / Decimal::from(prices.len());
    let deviation = variance.sqrt().ok_or_else(|| {
        AnalysisError::InvalidInput(format!("variance has no square root: {}", variance))
    })?;
    Ok(round_half_up(deviation, DEVIATION_SCALE))
}

fn z_score(current_price: Decimal, mean: Decimal, standard_deviation: Decimal) -> Option<Decimal> {
    if standard_deviation.is_zero() {
        return None;
    }
    Some(round_half_up(
        (current_price - mean) / standard_deviation,
        DEVIATION_SCALE,
    ))
}
