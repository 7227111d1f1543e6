/// optimizer.rs — Nelder–Mead simplex minimiser
///
/// ─────────────────────────────────────────────────────────────────────────
/// ALGORITHM
/// ─────────────────────────────────────────────────────────────────────────
///
/// Derivative-free search over ℝⁿ with n+1 vertices x_0..x_n, kept sorted
/// so that f(x_0) ≤ … ≤ f(x_n).  Centroid of the best n vertices: x̄.
///
///   Reflect:   x_r = x̄ + ρ (x̄ − x_n)                 ρ = 1
///   Expand:    x_e = x̄ + χ (x_r − x̄)                 χ = 2
///   Contract:  x_c = x̄ + γ (x_r − x̄)   (outside)     γ = ½
///              x_c = x̄ − γ (x̄ − x_n)   (inside)
///   Shrink:    x_i = x_0 + σ (x_i − x_0)               σ = ½
///
/// Convergence when both
///   f(x_n) − f(x_0) ≤ f_tol
///   max_i ‖x_i − x_0‖_∞ ≤ x_tol
///
/// Points with f = +∞ are treated as infeasible and are always worst.
/// ─────────────────────────────────────────────────────────────────────────
use tracing::trace;

const RHO: f64 = 1.0;
const CHI: f64 = 2.0;
const GAMMA: f64 = 0.5;
const SIGMA: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct NelderMead {
    pub max_iters: usize,
    pub f_tol: f64,
    pub x_tol: f64,
    /// Offset added to each coordinate to build the initial simplex
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iters: 5_000,
            f_tol: 1e-9,
            x_tol: 1e-7,
            initial_step: 0.1,
        }
    }
}

/// Outcome of one minimisation run.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

impl NelderMead {
    /// Minimise `f` from `x0`.  Never fails: a run that hits `max_iters`
    /// returns its best vertex with `converged = false`.
    pub fn minimize<F>(&self, mut f: F, x0: &[f64]) -> Minimum
    where
        F: FnMut(&[f64]) -> f64,
    {
        let n = x0.len();
        if n == 0 {
            return Minimum { x: Vec::new(), value: f(x0), iterations: 0, evaluations: 1, converged: true };
        }
        let mut evaluations = 0usize;
        let mut eval = |x: &[f64]| {
            evaluations += 1;
            let v = f(x);
            if v.is_nan() {
                f64::INFINITY
            } else {
                v
            }
        };

        // ── Initial simplex: x0 and x0 + step·e_i ──────────────────────────
        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        let v0 = eval(x0);
        simplex.push((x0.to_vec(), v0));
        for i in 0..n {
            let mut x = x0.to_vec();
            x[i] += self.initial_step;
            let v = eval(&x);
            simplex.push((x, v));
        }

        let mut iterations = 0usize;
        let mut converged = false;

        while iterations < self.max_iters {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

            if self.has_converged(&simplex) {
                converged = true;
                break;
            }
            iterations += 1;

            // Centroid of all but the worst vertex
            let mut centroid = vec![0.0; n];
            for (x, _) in &simplex[..n] {
                for (c, xi) in centroid.iter_mut().zip(x) {
                    *c += xi / n as f64;
                }
            }

            let worst = simplex[n].clone();
            let best_v = simplex[0].1;
            let second_worst_v = simplex[n - 1].1;

            let xr = along(&centroid, &worst.0, -RHO);
            let fr = eval(&xr);

            if fr < best_v {
                let xe = along(&centroid, &worst.0, -RHO * CHI);
                let fe = eval(&xe);
                simplex[n] = if fe < fr { (xe, fe) } else { (xr, fr) };
                trace!(iteration = iterations, "nelder-mead expand");
                continue;
            }

            if fr < second_worst_v {
                simplex[n] = (xr, fr);
                continue;
            }

            // Contraction: outside if the reflection beat the worst vertex.
            let (xc, fc) = if fr < worst.1 {
                let xc = along(&centroid, &worst.0, -RHO * GAMMA);
                let fc = eval(&xc);
                (xc, fc)
            } else {
                let xc = along(&centroid, &worst.0, GAMMA);
                let fc = eval(&xc);
                (xc, fc)
            };

            let accept = if fr < worst.1 { fc <= fr } else { fc < worst.1 };
            if accept {
                simplex[n] = (xc, fc);
                continue;
            }

            // Shrink toward the best vertex.
            trace!(iteration = iterations, "nelder-mead shrink");
            let best = simplex[0].0.clone();
            for vertex in simplex.iter_mut().skip(1) {
                let x: Vec<f64> = best
                    .iter()
                    .zip(&vertex.0)
                    .map(|(b, xi)| b + SIGMA * (xi - b))
                    .collect();
                let v = eval(&x);
                *vertex = (x, v);
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        if !converged {
            converged = self.has_converged(&simplex);
        }
        let (x, value) = simplex.swap_remove(0);
        Minimum { x, value, iterations, evaluations, converged }
    }

    fn has_converged(&self, sorted: &[(Vec<f64>, f64)]) -> bool {
        let best = &sorted[0];
        let worst = &sorted[sorted.len() - 1];
        if !best.1.is_finite() || !worst.1.is_finite() {
            return false;
        }
        if worst.1 - best.1 > self.f_tol {
            return false;
        }
        sorted[1..].iter().all(|(x, _)| {
            x.iter()
                .zip(&best.0)
                .all(|(a, b)| (a - b).abs() <= self.x_tol)
        })
    }
}

/// c + t·(w − c); t = −1 reflects w through c.
fn along(c: &[f64], w: &[f64], t: f64) -> Vec<f64> {
    c.iter().zip(w).map(|(ci, wi)| ci + t * (wi - ci)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_bowl() {
        let nm = NelderMead::default();
        let m = nm.minimize(|x| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2), &[0.0, 0.0]);
        assert!(m.converged);
        assert!((m.x[0] - 3.0).abs() < 1e-5, "x = {:?}", m.x);
        assert!((m.x[1] + 1.0).abs() < 1e-5, "x = {:?}", m.x);
        assert!(m.value < 1e-9);
    }

    #[test]
    fn rosenbrock() {
        let nm = NelderMead { max_iters: 10_000, f_tol: 1e-14, x_tol: 1e-9, initial_step: 0.5 };
        let m = nm.minimize(
            |x| 100.0 * (x[1] - x[0] * x[0]).powi(2) + (1.0 - x[0]).powi(2),
            &[-1.2, 1.0],
        );
        assert!((m.x[0] - 1.0).abs() < 1e-3, "x = {:?}", m.x);
        assert!((m.x[1] - 1.0).abs() < 1e-3, "x = {:?}", m.x);
    }

    #[test]
    fn infeasible_region_is_avoided() {
        // Minimum of (x − 2)² restricted to x < 1 lies at the boundary.
        let nm = NelderMead::default();
        let m = nm.minimize(
            |x| if x[0] >= 1.0 { f64::INFINITY } else { (x[0] - 2.0).powi(2) },
            &[0.0],
        );
        assert!(m.x[0] < 1.0);
        assert!(m.x[0] > 0.99, "x = {:?}", m.x);
    }

    #[test]
    fn budget_exhaustion_is_reported() {
        let nm = NelderMead { max_iters: 3, ..NelderMead::default() };
        let m = nm.minimize(|x| x.iter().map(|v| (v - 10.0).powi(2)).sum(), &[0.0, 0.0, 0.0]);
        assert!(!m.converged);
        assert_eq!(m.iterations, 3);
    }
}
