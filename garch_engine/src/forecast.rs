/// forecast.rs — Multi-step variance projection
///
///   E[σ²_{T+1}] = ω + α ε²_T + β σ²_T
///   E[σ²_{T+k}] = ω + (α+β) · E[σ²_{T+k-1}],   k ≥ 2
///
/// Converges geometrically to σ²_∞ = ω / (1 − α − β).
use serde::{Deserialize, Serialize};

use crate::error::{GarchError, Result};
use crate::models::garch::{annualize, FittedModel, GarchParams};
use crate::reconstruct::ConditionalVolatility;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityForecast {
    pub variance: Vec<f64>,
    pub volatility: Vec<f64>,
}

impl VolatilityForecast {
    pub fn horizon(&self) -> usize {
        self.variance.len()
    }

    pub fn annualized(&self, periods_per_year: f64) -> Vec<f64> {
        self.variance.iter().map(|&v| annualize(v, periods_per_year)).collect()
    }
}

pub fn forecast_variance(
    params: &GarchParams,
    last_variance: f64,
    last_shock_sq: f64,
    horizon: usize,
) -> Result<VolatilityForecast> {
    if horizon == 0 {
        return Err(GarchError::InvalidHorizon(horizon));
    }
    params.validate()?;
    for (index, (name, v)) in [("last variance", last_variance), ("last squared shock", last_shock_sq)]
        .into_iter()
        .enumerate()
    {
        if !(v.is_finite() && v >= 0.0) {
            return Err(GarchError::NumericalInstability {
                index,
                reason: format!("{name} must be finite and non-negative, got {v}"),
            });
        }
    }

    let persistence = params.persistence();
    let mut variance = Vec::with_capacity(horizon);
    let mut next = params.omega + params.alpha * last_shock_sq + params.beta * last_variance;
    for _ in 0..horizon {
        variance.push(next);
        next = params.omega + persistence * next;
    }
    let volatility = variance.iter().map(|v| v.sqrt()).collect();
    Ok(VolatilityForecast { variance, volatility })
}

/// Forecast from the end of a fitted series.
pub fn forecast(
    model: &FittedModel,
    returns: &[f64],
    fitted: &ConditionalVolatility,
    horizon: usize,
) -> Result<VolatilityForecast> {
    let (Some(&last_return), Some(last_variance)) = (returns.last(), fitted.last_variance()) else {
        return Err(GarchError::InsufficientData { required: 1, actual: 0 });
    };
    let eps = last_return - model.mu;
    forecast_variance(&model.params, last_variance, eps * eps, horizon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconstruct::reconstruct;
    use approx::assert_relative_eq;

    fn params() -> GarchParams {
        GarchParams::new(0.05, 0.10, 0.85).unwrap()
    }

    #[test]
    fn first_steps_by_hand() {
        let f = forecast_variance(&params(), 2.0, 4.0, 3).unwrap();
        let v1 = 0.05 + 0.10 * 4.0 + 0.85 * 2.0;
        let v2 = 0.05 + 0.95 * v1;
        let v3 = 0.05 + 0.95 * v2;
        assert_eq!(f.horizon(), 3);
        assert_relative_eq!(f.variance[0], v1, epsilon = 1e-12);
        assert_relative_eq!(f.variance[1], v2, epsilon = 1e-12);
        assert_relative_eq!(f.variance[2], v3, epsilon = 1e-12);
        assert_relative_eq!(f.volatility[2], v3.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn long_horizon_reaches_unconditional_variance() {
        let p = params();
        let f = forecast_variance(&p, 9.0, 16.0, 1_000).unwrap();
        assert!((f.variance[999] - p.unconditional_variance()).abs() < 1e-8);
        // monotone decay from above
        assert!(f.variance.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn zero_horizon_is_rejected() {
        assert_eq!(
            forecast_variance(&params(), 1.0, 1.0, 0),
            Err(GarchError::InvalidHorizon(0))
        );
    }

    #[test]
    fn negative_or_non_finite_state_is_rejected() {
        let p = params();
        assert!(matches!(
            forecast_variance(&p, -10.0, 0.0, 3),
            Err(GarchError::NumericalInstability { index: 0, .. })
        ));
        assert!(matches!(
            forecast_variance(&p, f64::NAN, 1.0, 2),
            Err(GarchError::NumericalInstability { index: 0, .. })
        ));
        assert!(matches!(
            forecast_variance(&p, 1.0, f64::INFINITY, 2),
            Err(GarchError::NumericalInstability { index: 1, .. })
        ));
        // a calm last day is a valid state
        assert!(forecast_variance(&p, 0.0, 0.0, 2).is_ok());
    }

    #[test]
    fn convenience_uses_last_shock() {
        let model: FittedModel = params().into();
        let returns = [0.3, -0.8, 1.4];
        let cv = reconstruct(&returns, &model).unwrap();
        let f = forecast(&model, &returns, &cv, 5).unwrap();
        let direct = forecast_variance(&model.params, cv.variance[2], 1.4 * 1.4, 5).unwrap();
        assert_eq!(f, direct);
    }

    #[test]
    fn annualized_scales_by_sqrt_periods() {
        let f = forecast_variance(&params(), 1.0, 1.0, 2).unwrap();
        let ann = f.annualized(252.0);
        assert_relative_eq!(ann[0], (f.variance[0] * 252.0).sqrt());
    }
}
