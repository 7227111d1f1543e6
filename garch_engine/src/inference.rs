/// inference.rs — Standard errors from the observed information matrix
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL MODEL
/// ─────────────────────────────────────────────────────────────────────────
///
///   H_ij  = ∂²(−L) / ∂θ_i ∂θ_j            (natural parameters θ)
///
///   central differences, h_i = max(1e-4·|θ_i|, 1e-6):
///     H_ii = [f(θ+h_i) − 2f(θ) + f(θ−h_i)] / h_i²
///     H_ij = [f(++) − f(+−) − f(−+) + f(−−)] / (4 h_i h_j)
///
///   Cov(θ̂) = H⁻¹ via Cholesky,   se_i = √Cov_ii
///   t_i = θ̂_i / se_i,  p_i = 2 · (1 − Φ(|t_i|))
///
/// Any perturbed point outside the feasible region, or an H that is not
/// positive definite, yields no inference.
/// ─────────────────────────────────────────────────────────────────────────
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::models::garch::{FittedModel, GarchParams, MeanModel};
use crate::models::likelihood::{negative_log_likelihood, Density};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    pub name: String,
    pub value: f64,
    pub std_error: f64,
    pub t_stat: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInference {
    pub estimates: Vec<ParameterEstimate>,
}

impl ParameterInference {
    pub fn get(&self, name: &str) -> Option<&ParameterEstimate> {
        self.estimates.iter().find(|e| e.name == name)
    }
}

/// Natural parameter vector and its names for `model`.
fn natural(model: &FittedModel) -> (Vec<&'static str>, Vec<f64>) {
    let mut names = Vec::new();
    let mut values = Vec::new();
    if model.mean == MeanModel::Constant {
        names.push("mu");
        values.push(model.mu);
    }
    let p = &model.params;
    names.extend(["omega", "alpha", "beta"]);
    values.extend([p.omega, p.alpha, p.beta]);
    if let Some(nu) = model.nu {
        names.push("nu");
        values.push(nu);
    }
    (names, values)
}

fn rebuild(template: &FittedModel, theta: &[f64]) -> FittedModel {
    let mut i = 0;
    let mut model = *template;
    if template.mean == MeanModel::Constant {
        model.mu = theta[0];
        i = 1;
    }
    model.params = GarchParams { omega: theta[i], alpha: theta[i + 1], beta: theta[i + 2] };
    if template.nu.is_some() {
        model.nu = Some(theta[i + 3]);
    }
    model
}

fn nll_at(returns: &[f64], template: &FittedModel, theta: &[f64]) -> f64 {
    let model = rebuild(template, theta);
    if model.params.validate().is_err() {
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

/// Numerical Hessian of −L at `theta`; `None` if any evaluation is not finite.
fn hessian(returns: &[f64], template: &FittedModel, theta: &[f64]) -> Option<DMatrix<f64>> {
    let k = theta.len();
    let h: Vec<f64> = theta.iter().map(|v| (1e-4 * v.abs()).max(1e-6)).collect();
    let f = |t: &[f64]| nll_at(returns, template, t);
    let shifted = |moves: &[(usize, f64)]| {
        let mut t = theta.to_vec();
        for &(i, d) in moves {
            t[i] += d;
        }
        f(&t)
    };

    let f0 = f(theta);
    if !f0.is_finite() {
        return None;
    }

    let mut hess = DMatrix::<f64>::zeros(k, k);
    for i in 0..k {
        let fp = shifted(&[(i, h[i])]);
        let fm = shifted(&[(i, -h[i])]);
        hess[(i, i)] = (fp - 2.0 * f0 + fm) / (h[i] * h[i]);

        for j in (i + 1)..k {
            let fpp = shifted(&[(i, h[i]), (j, h[j])]);
            let fpm = shifted(&[(i, h[i]), (j, -h[j])]);
            let fmp = shifted(&[(i, -h[i]), (j, h[j])]);
            let fmm = shifted(&[(i, -h[i]), (j, -h[j])]);
            let v = (fpp - fpm - fmp + fmm) / (4.0 * h[i] * h[j]);
            hess[(i, j)] = v;
            hess[(j, i)] = v;
        }
    }

    hess.iter().all(|v| v.is_finite()).then_some(hess)
}

/// H⁻¹ for a symmetric positive-definite H; `None` otherwise.
fn covariance(hess: DMatrix<f64>) -> Option<DMatrix<f64>> {
    hess.cholesky().map(|ch| ch.inverse())
}

/// Standard errors, t-statistics and p-values for every fitted parameter.
pub fn parameter_inference(returns: &[f64], model: &FittedModel) -> Option<ParameterInference> {
    let (names, theta) = natural(model);
    let hess = hessian(returns, model, &theta)?;
    let cov = covariance(hess)?;
    let normal = Normal::new(0.0, 1.0).ok()?;

    let mut estimates = Vec::with_capacity(theta.len());
    for (i, (name, value)) in names.into_iter().zip(theta).enumerate() {
        let var = cov[(i, i)];
        if !(var.is_finite() && var > 0.0) {
            return None;
        }
        let std_error = var.sqrt();
        let t_stat = value / std_error;
        let p_value = 2.0 * (1.0 - normal.cdf(t_stat.abs()));
        estimates.push(ParameterEstimate {
            name: name.to_string(),
            value,
            std_error,
            t_stat,
            p_value,
        });
    }
    Some(ParameterInference { estimates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{EstimatorConfig, GarchEstimator};
    use crate::simulate::GarchSimulator;
    use approx::assert_relative_eq;

    #[test]
    fn covariance_needs_positive_definite_information() {
        let cov = covariance(DMatrix::from_row_slice(2, 2, &[4.0, 2.0, 2.0, 3.0])).unwrap();
        // inverse of [[4,2],[2,3]] = [[3,-2],[-2,4]] / 8
        assert_relative_eq!(cov[(0, 0)], 0.375, epsilon = 1e-12);
        assert_relative_eq!(cov[(0, 1)], -0.25, epsilon = 1e-12);
        assert_relative_eq!(cov[(1, 1)], 0.5, epsilon = 1e-12);

        // saddle point of −L
        assert!(covariance(DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0])).is_none());
    }

    #[test]
    fn fitted_simulated_model_has_significant_coefficients() {
        let params = GarchParams::new(0.05, 0.10, 0.85).unwrap();
        let returns = GarchSimulator::new(params).sample(3_000, 21);
        let config = EstimatorConfig { inference: false, ..EstimatorConfig::default() };
        let fit = GarchEstimator::new(config).fit(&returns).unwrap();

        let inf = parameter_inference(&returns, &fit.model).expect("invertible Hessian");
        assert_eq!(inf.estimates.len(), 3);
        let alpha = inf.get("alpha").unwrap();
        let beta = inf.get("beta").unwrap();
        assert!(alpha.std_error > 0.0 && alpha.std_error < 0.05, "{alpha:?}");
        assert!(beta.p_value < 0.01, "{beta:?}");
        assert_relative_eq!(alpha.t_stat, alpha.value / alpha.std_error);
    }
}
