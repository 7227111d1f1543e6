/// models/garch.rs — GARCH(1,1) parameters and variance recursion
///
/// ```text
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL MODEL
/// ─────────────────────────────────────────────────────────────────────────
///
/// GARCH(1,1): Bollerslev (1986)
///
///   Return innovation:  ε_t = r_t − μ        (μ = 0 for the zero mean model)
///   Conditional variance update:
///
///       σ²_t = ω  +  α · ε²_{t-1}  +  β · σ²_{t-1}
///
///   Seed:  σ²_0 = Var(r) = Σ(r_t − r̄)² / n, floored
///
///   Constraints (covariance stationarity):
///     ω > 0,  α ≥ 0,  β ≥ 0,  α + β < 1
///
///   Long-run (unconditional) variance:
///       σ²_∞ = ω / (1 − α − β)
///
///   Half-life of a variance shock (periods):
///       h½ = ln(0.5) / ln(α + β)
///
///   Annualised volatility (from per-period σ²):
///       σ_annual = √(σ²_t · periods_per_year)
/// ─────────────────────────────────────────────────────────────────────────
/// ```
use serde::{Deserialize, Serialize};

use crate::error::{GarchError, Result};
use crate::series::population_variance;

/// Lower bound applied to every conditional variance (percent² units).
pub const DEFAULT_VARIANCE_FLOOR: f64 = 1e-8;

/// Trading days per year, for annualised views.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GarchParams {
    /// ω: constant variance term
    pub omega: f64,
    /// α: ARCH (shock) coefficient
    pub alpha: f64,
    /// β: GARCH (persistence) coefficient
    pub beta: f64,
}

impl GarchParams {
    /// Construct parameters, enforcing ω > 0, α ≥ 0, β ≥ 0, α + β < 1.
    pub fn new(omega: f64, alpha: f64, beta: f64) -> Result<Self> {
        let params = Self { omega, alpha, beta };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.omega.is_finite() && self.alpha.is_finite() && self.beta.is_finite()) {
            return Err(GarchError::InvalidParameters(format!(
                "non-finite parameters: ω={}, α={}, β={}",
                self.omega, self.alpha, self.beta
            )));
        }
        if self.omega <= 0.0 {
            return Err(GarchError::InvalidParameters(format!(
                "ω must be positive, got {}",
                self.omega
            )));
        }
        if self.alpha < 0.0 || self.beta < 0.0 {
            return Err(GarchError::InvalidParameters(format!(
                "α and β must be non-negative, got α={}, β={}",
                self.alpha, self.beta
            )));
        }
        if self.alpha + self.beta >= 1.0 {
            return Err(GarchError::InvalidParameters(format!(
                "stationarity requires α+β < 1, got α={}, β={}",
                self.alpha, self.beta
            )));
        }
        Ok(())
    }

    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// σ²_∞ = ω / (1 − α − β)
    pub fn unconditional_variance(&self) -> f64 {
        self.omega / (1.0 - self.persistence())
    }

    /// Periods for a variance shock to decay by half. Infinite-free because
    /// α + β < 1; zero persistence decays immediately.
    pub fn half_life(&self) -> f64 {
        let p = self.persistence();
        if p <= 0.0 {
            return 0.0;
        }
        0.5f64.ln() / p.ln()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeanModel {
    /// r_t = ε_t
    #[default]
    Zero,
    /// r_t = μ + ε_t with μ estimated jointly
    Constant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distribution {
    #[default]
    Normal,
    /// Unit-variance Student-t with estimated ν > 2
    StudentT,
}

/// Everything needed to reproduce the estimator's variance path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub params: GarchParams,
    pub mean: MeanModel,
    /// Fitted μ; always 0 for `MeanModel::Zero`.
    pub mu: f64,
    pub distribution: Distribution,
    /// Fitted ν for `Distribution::StudentT`.
    pub nu: Option<f64>,
    pub variance_floor: f64,
}

impl From<GarchParams> for FittedModel {
    fn from(params: GarchParams) -> Self {
        Self {
            params,
            mean: MeanModel::Zero,
            mu: 0.0,
            distribution: Distribution::Normal,
            nu: None,
            variance_floor: DEFAULT_VARIANCE_FLOOR,
        }
    }
}

/// σ²_0: population variance of the returns, floored. Non-finite input
/// yields a non-finite seed.
pub fn seed_variance(returns: &[f64], floor: f64) -> f64 {
    floored(population_variance(returns), floor)
}

/// Clamp to `floor` from below; NaN passes through unchanged.
fn floored(v: f64, floor: f64) -> f64 {
    if v < floor {
        floor
    } else {
        v
    }
}

/// Streaming GARCH(1,1) variance filter.
///
/// The first `step` emits the seed σ²_0; every later step applies the
/// recursion to the previous shock and variance.
#[derive(Debug, Clone)]
pub struct Garch11 {
    pub params: GarchParams,
    /// Conditional mean μ subtracted from each return
    pub mu: f64,
    /// Current conditional variance estimate σ²_t
    pub sigma2: f64,
    /// Previous squared innovation ε²_{t-1}; `None` before the first step
    prev_eps2: Option<f64>,
    floor: f64,
}

impl Garch11 {
    pub fn new(params: GarchParams, mu: f64, seed: f64, floor: f64) -> Self {
        Self {
            params,
            mu,
            sigma2: floored(seed, floor),
            prev_eps2: None,
            floor,
        }
    }

    /// Feed return r_t; returns σ²_t, the variance conditional on t−1.
    ///
    ///   σ²_t = max(ω + α·ε²_{t-1} + β·σ²_{t-1}, floor)
    pub fn step(&mut self, r: f64) -> f64 {
        if let Some(eps2) = self.prev_eps2 {
            let p = &self.params;
            self.sigma2 = floored(p.omega + p.alpha * eps2 + p.beta * self.sigma2, self.floor);
        }
        let eps = r - self.mu;
        self.prev_eps2 = Some(eps * eps);
        self.sigma2
    }

    /// Current conditional σ (per period).
    pub fn sigma(&self) -> f64 {
        self.sigma2.sqrt()
    }
}

/// Run the filter over a whole series, returning every σ²_t.
pub fn garch_filter(model: &FittedModel, returns: &[f64]) -> Vec<f64> {
    let seed = seed_variance(returns, model.variance_floor);
    let mut garch = Garch11::new(model.params, model.mu, seed, model.variance_floor);
    returns.iter().map(|&r| garch.step(r)).collect()
}

/// σ_annual = √(σ² · periods_per_year)
pub fn annualize(variance: f64, periods_per_year: f64) -> f64 {
    (variance * periods_per_year).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn derived_quantities() {
        let p = GarchParams::new(0.05, 0.10, 0.85).unwrap();
        assert_relative_eq!(p.persistence(), 0.95, epsilon = 1e-12);
        assert_relative_eq!(p.unconditional_variance(), 1.0, epsilon = 1e-12);
        // ln(0.5)/ln(0.95) ≈ 13.51 periods
        assert!((p.half_life() - 13.51).abs() < 0.01, "h = {}", p.half_life());
    }

    #[test]
    fn rejects_non_stationary_and_negative() {
        assert!(matches!(
            GarchParams::new(0.05, 0.5, 0.6),
            Err(GarchError::InvalidParameters(_))
        ));
        assert!(GarchParams::new(0.0, 0.1, 0.8).is_err());
        assert!(GarchParams::new(0.1, -0.01, 0.8).is_err());
        assert!(GarchParams::new(f64::NAN, 0.1, 0.8).is_err());
        assert!(GarchParams::new(0.1, 0.0, 0.0).is_ok());
    }

    #[test]
    fn first_step_emits_seed() {
        let p = GarchParams::new(0.05, 0.10, 0.85).unwrap();
        let mut g = Garch11::new(p, 0.0, 2.0, DEFAULT_VARIANCE_FLOOR);
        assert_relative_eq!(g.step(1.5), 2.0);
        // σ²_1 = 0.05 + 0.10·1.5² + 0.85·2.0
        assert_relative_eq!(g.step(0.0), 0.05 + 0.10 * 2.25 + 0.85 * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn shock_then_decay() {
        let p = GarchParams::new(1e-2, 0.10, 0.85).unwrap();
        let mut g = Garch11::new(p, 0.0, p.unconditional_variance(), DEFAULT_VARIANCE_FLOOR);
        g.step(5.0); // 5% shock
        let after_shock = g.step(0.0);
        let after_calm = g.step(0.0);
        assert!(after_shock > after_calm);
    }

    #[test]
    fn filter_respects_mean() {
        let p = GarchParams::new(0.05, 0.2, 0.7).unwrap();
        let model = FittedModel { mu: 1.0, mean: MeanModel::Constant, ..FittedModel::from(p) };
        // Returns equal to μ are zero shocks.
        let v = garch_filter(&model, &[1.0, 1.0, 1.0]);
        let seed = DEFAULT_VARIANCE_FLOOR;
        assert_relative_eq!(v[0], seed);
        assert_relative_eq!(v[1], 0.05 + 0.7 * seed, epsilon = 1e-12);
    }

    #[test]
    fn nan_is_not_floored_away() {
        let p = GarchParams::new(0.05, 0.10, 0.85).unwrap();
        assert!(seed_variance(&[1.0, f64::NAN, 2.0], DEFAULT_VARIANCE_FLOOR).is_nan());

        let mut g = Garch11::new(p, 0.0, 1.0, DEFAULT_VARIANCE_FLOOR);
        g.step(f64::NAN);
        assert!(g.step(0.0).is_nan());
    }

    #[test]
    fn annualised_daily_vol() {
        assert_relative_eq!(annualize(1.0, TRADING_DAYS_PER_YEAR), 252f64.sqrt());
    }
}
