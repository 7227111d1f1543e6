/// estimator.rs — Maximum-likelihood GARCH(1,1) estimation
///
/// ─────────────────────────────────────────────────────────────────────────
/// CONSTRAINED SEARCH VIA REPARAMETERISATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// The simplex works on unconstrained θ ∈ ℝᵏ; every θ maps into the
/// feasible region ω > 0, α ≥ 0, β ≥ 0, α + β < 1:
///
///   ω     = exp(θ_ω)
///   α + β = logistic(θ_p)          persistence ∈ (0, 1)
///   α     = (α + β) · logistic(θ_s) share of persistence from shocks
///   β     = (α + β) − α
///   μ     = θ_μ                     (constant mean only)
///   ν     = 2 + exp(θ_ν)            (Student-t only)
///
/// Objective: −L(θ) from `models::likelihood`.
///
/// Default start (usual daily-equity priors):
///   α₀ = 0.10,  β₀ = 0.85,  ω₀ = Var(r) · (1 − α₀ − β₀),  μ₀ = r̄,  ν₀ = 8
///
/// After a converged run the simplex is rebuilt around the best vertex and
/// the search repeated until a restart stops improving −L by more than the
/// tolerance. All runs share one iteration budget.
/// ─────────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{GarchError, Result};
use crate::inference::{parameter_inference, ParameterInference};
use crate::models::garch::{
    Distribution, FittedModel, GarchParams, MeanModel, DEFAULT_VARIANCE_FLOOR,
};
use crate::models::likelihood::{negative_log_likelihood, Density};
use crate::optimizer::NelderMead;
use crate::series::{mean, population_variance};

/// Smallest α or β share used when mapping a start point into θ-space.
const MIN_START_WEIGHT: f64 = 1e-4;
const DEFAULT_NU: f64 = 8.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Fewer returns than this fail with `InsufficientData`
    pub min_observations: usize,
    /// Nelder–Mead iteration budget shared by all restarts
    pub max_iterations: usize,
    /// Objective spread at which the simplex counts as converged
    pub tolerance: f64,
    /// Vertex spread (θ-space) at which the simplex counts as converged
    pub param_tolerance: f64,
    pub max_restarts: usize,
    pub variance_floor: f64,
    pub mean: MeanModel,
    pub distribution: Distribution,
    /// Explicit starting point; `None` uses the default priors
    pub start: Option<GarchParams>,
    /// Compute standard errors from the numerical Hessian
    pub inference: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_observations: 30,
            max_iterations: 10_000,
            tolerance: 1e-8,
            param_tolerance: 1e-6,
            max_restarts: 3,
            variance_floor: DEFAULT_VARIANCE_FLOOR,
            mean: MeanModel::Zero,
            distribution: Distribution::Normal,
            start: None,
            inference: true,
        }
    }
}

/// Convergence record of a fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub log_likelihood: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub restarts: usize,
    pub converged: bool,
    pub n_obs: usize,
    pub n_params: usize,
    pub aic: f64,
    pub bic: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarchFit {
    pub model: FittedModel,
    pub diagnostics: FitDiagnostics,
    pub inference: Option<ParameterInference>,
}

impl GarchFit {
    pub fn params(&self) -> &GarchParams {
        &self.model.params
    }
}

/// Maps between θ-space and the fitted model for one (mean, distribution)
/// combination.
#[derive(Debug, Clone, Copy)]
struct Layout {
    mean: MeanModel,
    distribution: Distribution,
    floor: f64,
}

impl Layout {
    fn dim(&self) -> usize {
        3 + usize::from(self.mean == MeanModel::Constant)
            + usize::from(self.distribution == Distribution::StudentT)
    }

    fn encode(&self, params: &GarchParams, mu: f64, nu: f64) -> Vec<f64> {
        let alpha = params.alpha.max(MIN_START_WEIGHT);
        let beta = params.beta.max(MIN_START_WEIGHT);
        let persistence = (alpha + beta).min(1.0 - MIN_START_WEIGHT);

        let mut theta = Vec::with_capacity(self.dim());
        if self.mean == MeanModel::Constant {
            theta.push(mu);
        }
        theta.push(params.omega.ln());
        theta.push(logit(persistence));
        theta.push(logit(alpha / (alpha + beta)));
        if self.distribution == Distribution::StudentT {
            theta.push((nu - 2.0).ln());
        }
        theta
    }

    fn decode(&self, theta: &[f64]) -> FittedModel {
        let mut i = 0;
        let mu = if self.mean == MeanModel::Constant {
            i += 1;
            theta[0]
        } else {
            0.0
        };
        let omega = theta[i].exp();
        let persistence = logistic(theta[i + 1]);
        let alpha = persistence * logistic(theta[i + 2]);
        let beta = persistence - alpha;
        let nu = (self.distribution == Distribution::StudentT).then(|| 2.0 + theta[i + 3].exp());

        FittedModel {
            params: GarchParams { omega, alpha, beta },
            mean: self.mean,
            mu,
            distribution: self.distribution,
            nu,
            variance_floor: self.floor,
        }
    }

    fn objective(&self, returns: &[f64], theta: &[f64]) -> f64 {
        let model = self.decode(theta);
        let p = &model.params;
        if !(p.omega > 0.0 && p.omega.is_finite() && p.alpha + p.beta < 1.0) {
            return f64::INFINITY;
        }
        let density = match model.nu {
            Some(nu) => match Density::student_t(nu) {
                Ok(d) => d,
                Err(_) => return f64::INFINITY,
            },
            None => Density::Normal,
        };
        negative_log_likelihood(returns, &model, density)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GarchEstimator {
    pub config: EstimatorConfig,
}

impl GarchEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Fit ω, α, β (and μ, ν where configured) by maximum likelihood.
    pub fn fit(&self, returns: &[f64]) -> Result<GarchFit> {
        let cfg = &self.config;
        let required = cfg.min_observations.max(2);
        if returns.len() < required {
            return Err(GarchError::InsufficientData { required, actual: returns.len() });
        }
        if let Some(index) = returns.iter().position(|r| !r.is_finite()) {
            return Err(GarchError::NumericalInstability {
                index,
                reason: format!("non-finite return {}", returns[index]),
            });
        }

        let layout = Layout {
            mean: cfg.mean,
            distribution: cfg.distribution,
            floor: cfg.variance_floor,
        };

        let sample_var = population_variance(returns).max(cfg.variance_floor);
        let start = match cfg.start {
            Some(p) => {
                p.validate()?;
                p
            }
            None => GarchParams {
                omega: sample_var * (1.0 - 0.10 - 0.85),
                alpha: 0.10,
                beta: 0.85,
            },
        };
        let mu0 = if cfg.mean == MeanModel::Constant { mean(returns) } else { 0.0 };
        let mut theta = layout.encode(&start, mu0, DEFAULT_NU);

        debug!(
            n = returns.len(),
            omega = start.omega,
            alpha = start.alpha,
            beta = start.beta,
            "GARCH(1,1) estimation start"
        );

        let objective = |th: &[f64]| layout.objective(returns, th);

        let mut iterations = 0usize;
        let mut evaluations = 0usize;
        let mut restarts = 0usize;
        let mut best_value = f64::INFINITY;

        loop {
            let solver = NelderMead {
                max_iters: cfg.max_iterations.saturating_sub(iterations),
                f_tol: cfg.tolerance,
                x_tol: cfg.param_tolerance,
                initial_step: if restarts == 0 { 0.5 } else { 0.05 },
            };
            let run = solver.minimize(objective, &theta);
            iterations += run.iterations;
            evaluations += run.evaluations;

            if !run.value.is_finite() {
                return Err(GarchError::OptimizationDivergence {
                    iterations,
                    reason: "no parameter set with a finite likelihood".into(),
                });
            }
            if !run.converged {
                if restarts == 0 {
                    return Err(GarchError::OptimizationDivergence {
                        iterations,
                        reason: format!(
                            "iteration budget {} exhausted at −logL={:.6}",
                            cfg.max_iterations, run.value
                        ),
                    });
                }
                // A restart ran out of budget; the earlier converged vertex stands.
                if run.value < best_value {
                    best_value = run.value;
                    theta = run.x;
                }
                break;
            }

            let improvement = best_value - run.value;
            if run.value < best_value {
                best_value = run.value;
                theta = run.x;
            }
            debug!(restart = restarts, nll = best_value, iterations, "simplex converged");

            if improvement <= cfg.tolerance * 10.0
                || restarts >= cfg.max_restarts
                || iterations >= cfg.max_iterations
            {
                break;
            }
            restarts += 1;
        }

        let model = layout.decode(&theta);
        // A decoded θ always satisfies the invariants; anything else is a bug.
        model.params.validate()?;

        let n_obs = returns.len();
        let n_params = layout.dim();
        let log_likelihood = -best_value;
        let diagnostics = FitDiagnostics {
            log_likelihood,
            iterations,
            evaluations,
            restarts,
            converged: true,
            n_obs,
            n_params,
            aic: 2.0 * n_params as f64 - 2.0 * log_likelihood,
            bic: n_params as f64 * (n_obs as f64).ln() - 2.0 * log_likelihood,
        };

        let inference = if cfg.inference {
            let inf = parameter_inference(returns, &model);
            if inf.is_none() {
                warn!("Hessian not invertible at the optimum; standard errors unavailable");
            }
            inf
        } else {
            None
        };

        info!(
            omega = model.params.omega,
            alpha = model.params.alpha,
            beta = model.params.beta,
            log_likelihood,
            iterations,
            "GARCH(1,1) fitted"
        );

        Ok(GarchFit { model, diagnostics, inference })
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}
