/// reconstruct.rs — Conditional volatility from fitted parameters
///
/// Re-runs the variance recursion with the estimator's seed and floor, so
/// the path is exactly the one the likelihood was evaluated on. Never
/// re-estimates.
///
///   σ²_0 = max(Var(r), floor)
///   σ²_t = max(ω + α ε²_{t-1} + β σ²_{t-1}, floor)
///   z_t  = (r_t − μ) / σ_t
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GarchError, Result};
use crate::models::garch::{garch_filter, FittedModel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalVolatility {
    pub variance: Vec<f64>,
    pub volatility: Vec<f64>,
    pub standardized_residuals: Vec<f64>,
}

impl ConditionalVolatility {
    pub fn len(&self) -> usize {
        self.variance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variance.is_empty()
    }

    /// σ²_T, the forecaster's starting point.
    pub fn last_variance(&self) -> Option<f64> {
        self.variance.last().copied()
    }
}

pub fn reconstruct(returns: &[f64], model: &FittedModel) -> Result<ConditionalVolatility> {
    if returns.is_empty() {
        return Err(GarchError::InsufficientData { required: 1, actual: 0 });
    }
    if let Some(index) = returns.iter().position(|r| !r.is_finite()) {
        return Err(GarchError::NumericalInstability {
            index,
            reason: format!("non-finite return {}", returns[index]),
        });
    }
    model.params.validate()?;

    let variance = garch_filter(model, returns);
    if let Some(index) = variance.iter().position(|v| !v.is_finite()) {
        return Err(GarchError::NumericalInstability {
            index,
            reason: format!("conditional variance {}", variance[index]),
        });
    }

    let volatility: Vec<f64> = variance.iter().map(|v| v.sqrt()).collect();
    let standardized_residuals = returns
        .iter()
        .zip(&volatility)
        .map(|(r, s)| (r - model.mu) / s)
        .collect();

    debug!(n = returns.len(), last_variance = variance[variance.len() - 1], "reconstructed");

    Ok(ConditionalVolatility { variance, volatility, standardized_residuals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::garch::{GarchParams, DEFAULT_VARIANCE_FLOOR};
    use approx::assert_relative_eq;

    fn model() -> FittedModel {
        GarchParams::new(0.05, 0.10, 0.85).unwrap().into()
    }

    #[test]
    fn two_calls_are_identical() {
        let returns = [0.4, -1.2, 0.7, 2.5, -0.3, 0.0, 1.1];
        let a = reconstruct(&returns, &model()).unwrap();
        let b = reconstruct(&returns, &model()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), returns.len());
    }

    #[test]
    fn hand_computed_path() {
        let returns = [1.0, -1.0, 2.0];
        let cv = reconstruct(&returns, &model()).unwrap();
        // mean 2/3, population variance = (1/9 + 25/9 + 16/9)/3 = 14/9
        let s0 = 14.0 / 9.0;
        let s1 = 0.05 + 0.10 * 1.0 + 0.85 * s0;
        let s2 = 0.05 + 0.10 * 1.0 + 0.85 * s1;
        assert_relative_eq!(cv.variance[0], s0, epsilon = 1e-12);
        assert_relative_eq!(cv.variance[1], s1, epsilon = 1e-12);
        assert_relative_eq!(cv.variance[2], s2, epsilon = 1e-12);
        assert_relative_eq!(cv.standardized_residuals[2], 2.0 / s2.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(cv.last_variance().unwrap(), s2);
    }

    #[test]
    fn zero_returns_stay_at_floor() {
        let p = GarchParams::new(1e-12, 0.05, 0.90).unwrap();
        let cv = reconstruct(&[0.0; 200], &p.into()).unwrap();
        assert!(cv.variance.iter().all(|v| v.is_finite() && *v >= DEFAULT_VARIANCE_FLOOR));
        assert!(cv.standardized_residuals.iter().all(|z| *z == 0.0));
    }

    #[test]
    fn constant_mean_shifts_residuals() {
        let mut m = model();
        m.mu = 0.5;
        let cv = reconstruct(&[0.5, 1.5], &m).unwrap();
        assert_eq!(cv.standardized_residuals[0], 0.0);
        assert!(cv.standardized_residuals[1] > 0.0);
    }

    #[test]
    fn non_finite_return_is_rejected() {
        let err = reconstruct(&[1.0, f64::NAN, 2.0, -1.0], &model()).unwrap_err();
        assert!(matches!(err, GarchError::NumericalInstability { index: 1, .. }), "{err:?}");
        let err = reconstruct(&[0.5, -0.2, f64::INFINITY], &model()).unwrap_err();
        assert!(matches!(err, GarchError::NumericalInstability { index: 2, .. }), "{err:?}");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            reconstruct(&[], &model()),
            Err(GarchError::InsufficientData { required: 1, actual: 0 })
        ));
    }
}
