/// models/likelihood.rs — GARCH(1,1) log-likelihood
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL MODEL
/// ─────────────────────────────────────────────────────────────────────────
///
/// Gaussian innovations, z_t ~ N(0, 1):
///
///   ℓ_t = −½ · ( ln 2π + ln σ²_t + ε²_t / σ²_t )
///
/// Standardized Student-t innovations (unit variance, ν > 2):
///
///   ℓ_t = ln Γ((ν+1)/2) − ln Γ(ν/2) − ½ ln((ν−2)π) − ½ ln σ²_t
///         − (ν+1)/2 · ln(1 + ε²_t / ((ν−2) σ²_t))
///
///   L = Σ_t ℓ_t
///
/// σ²_t comes from the floored recursion in `models::garch`, so ln σ²_t
/// and ε²_t/σ²_t are always defined.
/// ─────────────────────────────────────────────────────────────────────────
use statrs::function::gamma::ln_gamma;

use crate::error::{GarchError, Result};
use crate::models::garch::{seed_variance, Distribution, FittedModel, Garch11};

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Per-observation log density with its constants precomputed.
#[derive(Debug, Clone, Copy)]
pub enum Density {
    Normal,
    StudentT { nu: f64, log_norm: f64 },
}

impl Density {
    pub fn for_model(model: &FittedModel) -> Result<Self> {
        match model.distribution {
            Distribution::Normal => Ok(Density::Normal),
            Distribution::StudentT => {
                let nu = model.nu.ok_or_else(|| {
                    GarchError::InvalidParameters("Student-t model without ν".into())
                })?;
                Self::student_t(nu)
            }
        }
    }

    pub fn student_t(nu: f64) -> Result<Self> {
        if !nu.is_finite() || nu <= 2.0 {
            return Err(GarchError::InvalidParameters(format!(
                "Student-t ν must be finite and > 2, got {nu}"
            )));
        }
        let log_norm = ln_gamma((nu + 1.0) / 2.0)
            - ln_gamma(nu / 2.0)
            - 0.5 * ((nu - 2.0) * std::f64::consts::PI).ln();
        Ok(Density::StudentT { nu, log_norm })
    }

    /// ℓ_t for squared innovation ε² under conditional variance σ².
    #[inline]
    pub fn log_pdf(&self, eps2: f64, sigma2: f64) -> f64 {
        match *self {
            Density::Normal => -0.5 * (LN_2PI + sigma2.ln() + eps2 / sigma2),
            Density::StudentT { nu, log_norm } => {
                log_norm
                    - 0.5 * sigma2.ln()
                    - 0.5 * (nu + 1.0) * (1.0 + eps2 / ((nu - 2.0) * sigma2)).ln()
            }
        }
    }
}

/// Total log-likelihood L of `returns` under `model`.
///
/// Fails on empty input, invalid parameters, or a non-finite term.
pub fn log_likelihood(returns: &[f64], model: &FittedModel) -> Result<f64> {
    if returns.is_empty() {
        return Err(GarchError::InsufficientData { required: 1, actual: 0 });
    }
    model.params.validate()?;
    let density = Density::for_model(model)?;

    let seed = seed_variance(returns, model.variance_floor);
    let mut garch = Garch11::new(model.params, model.mu, seed, model.variance_floor);
    let mut total = 0.0;
    for (t, &r) in returns.iter().enumerate() {
        let sigma2 = garch.step(r);
        let eps = r - model.mu;
        let term = density.log_pdf(eps * eps, sigma2);
        if !term.is_finite() {
            return Err(GarchError::NumericalInstability {
                index: t,
                reason: format!("log-density {term} with σ²={sigma2}, r={r}"),
            });
        }
        total += term;
    }
    Ok(total)
}

/// −L for the optimizer. Any non-finite term maps to +∞ so the simplex
/// treats the point as infeasible instead of failing the search.
pub(crate) fn negative_log_likelihood(returns: &[f64], model: &FittedModel, density: Density) -> f64 {
    let seed = seed_variance(returns, model.variance_floor);
    let mut garch = Garch11::new(model.params, model.mu, seed, model.variance_floor);
    let mut nll = 0.0;
    for &r in returns {
        let sigma2 = garch.step(r);
        let eps = r - model.mu;
        nll -= density.log_pdf(eps * eps, sigma2);
    }
    if nll.is_finite() {
        nll
    } else {
        f64::INFINITY
    }
}
