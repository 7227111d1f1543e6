/// pipeline.rs — prices → returns → fit → conditional volatility → forecast
///
/// Each stage consumes the previous stage's output read-only. A failing
/// stage aborts the run; there is no partial output.
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GarchError, Result};
use crate::estimator::{EstimatorConfig, GarchEstimator, GarchFit};
use crate::forecast::{forecast, VolatilityForecast};
use crate::reconstruct::{reconstruct, ConditionalVolatility};
use crate::series::{PriceSeries, ReturnKind, ReturnSeries};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityPipeline {
    pub return_kind: ReturnKind,
    pub estimator: EstimatorConfig,
    pub horizon: usize,
}

impl Default for VolatilityPipeline {
    fn default() -> Self {
        Self {
            return_kind: ReturnKind::Simple,
            estimator: EstimatorConfig::default(),
            horizon: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub returns: ReturnSeries,
    pub fit: GarchFit,
    pub volatility: ConditionalVolatility,
    pub forecast: VolatilityForecast,
}

impl VolatilityPipeline {
    pub fn run(&self, prices: &PriceSeries) -> Result<PipelineOutput> {
        if self.horizon == 0 {
            return Err(GarchError::InvalidHorizon(0));
        }

        let returns = ReturnSeries::from_prices(prices, self.return_kind)?;
        info!(prices = prices.len(), returns = returns.len(), kind = ?self.return_kind, "returns built");

        self.run_returns(returns)
    }

    /// Same stages, starting from an existing return series.
    pub fn run_returns(&self, returns: ReturnSeries) -> Result<PipelineOutput> {
        if self.horizon == 0 {
            return Err(GarchError::InvalidHorizon(0));
        }

        let fit = GarchEstimator::new(self.estimator.clone()).fit(returns.values())?;

        let volatility = reconstruct(returns.values(), &fit.model)?;
        info!(
            last_volatility = volatility.volatility.last().copied().unwrap_or(f64::NAN),
            "conditional volatility reconstructed"
        );

        let forecast = forecast(&fit.model, returns.values(), &volatility, self.horizon)?;
        info!(horizon = forecast.horizon(), "forecast complete");

        Ok(PipelineOutput { returns, fit, volatility, forecast })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::garch::GarchParams;
    use crate::series::PricePoint;
    use crate::simulate::GarchSimulator;
    use chrono::{Duration, NaiveDate};

    fn simulated_prices(n: usize, seed: u64) -> PriceSeries {
        let params = GarchParams::new(0.05, 0.10, 0.85).unwrap();
        let returns = GarchSimulator::new(params).sample(n, seed);
        let start = NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
        let mut price = 100.0;
        let mut points = vec![PricePoint { date: start, price }];
        for (i, r) in returns.iter().enumerate() {
            price *= 1.0 + r / 100.0;
            points.push(PricePoint { date: start + Duration::days(i as i64 + 1), price });
        }
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn all_stages_line_up() {
        let prices = simulated_prices(1_500, 5);
        let out = VolatilityPipeline::default().run(&prices).unwrap();

        assert_eq!(out.returns.len(), prices.len() - 1);
        assert_eq!(out.volatility.len(), out.returns.len());
        assert_eq!(out.forecast.horizon(), 5);
        out.fit.params().validate().unwrap();
        // first forecast step continues the reconstructed path
        let p = out.fit.params();
        let last_r = out.returns.values()[out.returns.len() - 1];
        let expected = p.omega + p.alpha * last_r * last_r + p.beta * out.volatility.last_variance().unwrap();
        assert!((out.forecast.variance[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_horizon_fails_before_fitting() {
        let pipeline = VolatilityPipeline { horizon: 0, ..VolatilityPipeline::default() };
        let prices = simulated_prices(10, 1);
        assert_eq!(pipeline.run(&prices).unwrap_err(), GarchError::InvalidHorizon(0));
    }

    #[test]
    fn short_history_fails_in_estimator() {
        let prices = simulated_prices(12, 2);
        let err = VolatilityPipeline::default().run(&prices).unwrap_err();
        assert!(matches!(err, GarchError::InsufficientData { required: 30, actual: 12 }));
    }
}
