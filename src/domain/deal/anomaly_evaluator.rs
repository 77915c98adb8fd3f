//! Ingestion-time anomaly decision and read-time deal ranking

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::price::{
    compute_statistics, drop_percentage, exceeds_drop_threshold, is_anomaly_by_z_score,
    AnomalyThresholds, PriceStatistics,
};
use crate::domain::route::{latest_observation, PriceObservation, Route};
use crate::shared::errors::AnalysisError;
use super::{Deal, RouteHistory};

/// Applies the configured thresholds to already-fetched price data.
///
/// Holds no mutable state; persistence stays with the caller.
#[derive(Debug, Clone)]
pub struct AnomalyEvaluator {
    thresholds: AnomalyThresholds,
}

impl AnomalyEvaluator {
    pub fn new(thresholds: AnomalyThresholds) -> Self {
        Self { thresholds }
    }

    /// Decide whether a freshly stored observation is anomalous.
    ///
    /// `history` is the route's full post-insert history. Histories shorter
    /// than `min_samples` are never anomalous and no statistics are computed.
    /// An observation that is already flagged stays flagged.
    pub fn evaluate_anomaly(
        &self,
        route: &Route,
        observation: &PriceObservation,
        history: &[PriceObservation],
    ) -> Result<bool, AnalysisError> {
        if observation.is_anomaly {
            return Ok(true);
        }
        if history.len() < self.thresholds.min_samples {
            info!(
                "Not enough samples to evaluate anomaly for route {}, {} received, {} required",
                route.id,
                history.len(),
                self.thresholds.min_samples
            );
            return Ok(false);
        }

        let prices = prices_of(history);
        let statistics = compute_statistics(&prices, observation.price)?;
        let anomalous = is_anomaly_by_z_score(statistics.z_score, self.thresholds.z_score_threshold);

        if anomalous {
            info!(
                "Detected anomaly for price snapshot, id={}, price={}, z_score={:?}",
                observation.id, observation.price, statistics.z_score
            );
        } else {
            info!(
                "Did not detect anomaly for price snapshot, id={}, price={}",
                observation.id, observation.price
            );
        }
        Ok(anomalous)
    }

    /// Statistics of a route's full history against its latest observation.
    ///
    /// Fails with `InsufficientData` below `min_samples`.
    pub fn route_statistics(
        &self,
        route: &Route,
        history: &[PriceObservation],
    ) -> Result<PriceStatistics, AnalysisError> {
        let insufficient = AnalysisError::InsufficientData {
            route_id: route.id,
            required: self.thresholds.min_samples,
            actual: history.len(),
        };
        if history.len() < self.thresholds.min_samples {
            return Err(insufficient);
        }
        let latest = latest_observation(history).ok_or(insufficient)?;
        compute_statistics(&prices_of(history), latest.price)
    }

    /// Compute deals across routes, largest drop first.
    ///
    /// Routes with too little history are skipped. Each route qualifies when
    /// either the z-score or the percentage criterion holds.
    pub fn rank_deals(&self, routes: &[RouteHistory]) -> Result<Vec<Deal>, AnalysisError> {
        let mut deals = Vec::new();

        for entry in routes {
            if let Some(deal) = self.evaluate_deal(entry)? {
                deals.push(deal);
            }
        }

        deals.sort_by(|a, b| b.drop_percentage.cmp(&a.drop_percentage));
        Ok(deals)
    }

    fn evaluate_deal(&self, entry: &RouteHistory) -> Result<Option<Deal>, AnalysisError> {
        let route = &entry.route;
        if entry.history.len() < self.thresholds.min_samples {
            debug!("Skipping route {}: {} samples", route.id, entry.history.len());
            return Ok(None);
        }
        let latest = match latest_observation(&entry.history) {
            Some(latest) => latest,
            None => return Ok(None),
        };

        let statistics = compute_statistics(&prices_of(&entry.history), latest.price)?;
        let drop = drop_percentage(statistics.mean, latest.price)?;

        let by_z_score = is_anomaly_by_z_score(statistics.z_score, self.thresholds.z_score_threshold);
        let by_percentage = exceeds_drop_threshold(
            statistics.mean,
            latest.price,
            self.thresholds.percentage_threshold,
        );
        if !(by_z_score || by_percentage) {
            return Ok(None);
        }

        debug!(
            "Route {} qualifies as a deal: drop={}%, by_z_score={}, by_percentage={}",
            route.id, drop, by_z_score, by_percentage
        );
        Ok(Some(Deal {
            route_id: route.id,
            origin: route.origin.clone(),
            destination: route.destination.clone(),
            departure_date: route.departure_date,
            current_price: latest.price,
            average_price: statistics.mean,
            drop_percentage: drop,
            currency: latest.currency.clone(),
            observed_at: latest.observed_at,
        }))
    }
}

fn prices_of(history: &[PriceObservation]) -> Vec<Decimal> {
    history.iter().map(|observation| observation.price).collect()
}
