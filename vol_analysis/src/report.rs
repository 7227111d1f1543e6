/// report.rs — Text and JSON summaries of a pipeline run
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use garch_engine::{PipelineOutput, TRADING_DAYS_PER_YEAR};

/// p-value below which a coefficient is reported as significant
const SIGNIFICANCE: f64 = 0.05;

pub struct FitReport<'a> {
    pub symbol: &'a str,
    pub output: &'a PipelineOutput,
    /// Show forecasts as annualized volatility next to the daily figures
    pub annualize: bool,
}

impl<'a> FitReport<'a> {
    pub fn new(symbol: &'a str, output: &'a PipelineOutput) -> Self {
        Self { symbol, output, annualize: false }
    }

    pub fn annualized(mut self, annualize: bool) -> Self {
        self.annualize = annualize;
        self
    }

    fn coefficient_line(&self, f: &mut fmt::Formatter<'_>, label: &str, name: &str, value: f64) -> fmt::Result {
        match self.output.fit.inference.as_ref().and_then(|inf| inf.get(name)) {
            Some(e) => writeln!(
                f,
                "  {label:<14} : {value:>10.4}   se {:.4}  t {:>7.2}  p {:.4}{}",
                e.std_error,
                e.t_stat,
                e.p_value,
                if e.p_value < SIGNIFICANCE { "  *" } else { "" }
            ),
            None => writeln!(f, "  {label:<14} : {value:>10.4}"),
        }
    }
}

impl fmt::Display for FitReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = self.output;
        let model = &out.fit.model;
        let p = &model.params;
        let d = &out.fit.diagnostics;
        let dates = out.returns.dates();

        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  GARCH(1,1) VOLATILITY REPORT — {}", self.symbol)?;
        writeln!(f, "════════════════════════════════════════════")?;
        if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
            writeln!(f, "  Sample         : {first} → {last}")?;
        }
        writeln!(f, "  Observations   : {}", d.n_obs)?;
        writeln!(f, "  Returns        : {:?} (%)", out.returns.kind())?;
        writeln!(f, "  Mean model     : {:?}", model.mean)?;
        writeln!(f, "  Distribution   : {:?}", model.distribution)?;
        writeln!(f, "────────────────────────────────────────────")?;

        if model.mean == garch_engine::MeanModel::Constant {
            self.coefficient_line(f, "mu", "mu", model.mu)?;
        }
        self.coefficient_line(f, "omega", "omega", p.omega)?;
        self.coefficient_line(f, "alpha[1]", "alpha", p.alpha)?;
        self.coefficient_line(f, "beta[1]", "beta", p.beta)?;
        if let Some(nu) = model.nu {
            self.coefficient_line(f, "nu", "nu", nu)?;
        }
        if out.fit.inference.is_none() {
            writeln!(f, "  (standard errors unavailable)")?;
        }
        writeln!(f, "────────────────────────────────────────────")?;

        let persistence = p.persistence();
        writeln!(f, "  Persistence    : {persistence:.4}")?;
        writeln!(f, "  Half-life      : {:.1} days", p.half_life())?;
        writeln!(f, "  Long-run vol   : {:.3}% daily", p.unconditional_variance().sqrt())?;
        if persistence > 0.9 {
            writeln!(f, "  Volatility is highly persistent; shocks decay slowly.")?;
        }
        writeln!(f, "────────────────────────────────────────────")?;

        writeln!(f, "  Log-likelihood : {:.3}", d.log_likelihood)?;
        writeln!(f, "  AIC / BIC      : {:.3} / {:.3}", d.aic, d.bic)?;
        writeln!(
            f,
            "  Optimizer      : {} iterations, {} evaluations, {} restarts{}",
            d.iterations,
            d.evaluations,
            d.restarts,
            if d.converged { "" } else { " (not converged)" }
        )?;
        writeln!(f, "────────────────────────────────────────────")?;

        writeln!(f, "  {}-day volatility forecast (daily %)", out.forecast.horizon())?;
        let annual = self.annualize.then(|| out.forecast.annualized(TRADING_DAYS_PER_YEAR));
        for (i, vol) in out.forecast.volatility.iter().enumerate() {
            match &annual {
                Some(a) => writeln!(f, "  T+{:<3}          : {vol:.3}%   ({:.2}% annualized)", i + 1, a[i])?,
                None => writeln!(f, "  T+{:<3}          : {vol:.3}%", i + 1)?,
            }
        }
        writeln!(f, "════════════════════════════════════════════")
    }
}

/// Machine-readable form of a run.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub symbol: &'a str,
    pub generated_at: DateTime<Utc>,
    pub persistence: f64,
    pub half_life: f64,
    #[serde(flatten)]
    pub output: &'a PipelineOutput,
}

impl<'a> JsonReport<'a> {
    pub fn new(symbol: &'a str, output: &'a PipelineOutput) -> Self {
        let p = output.fit.params();
        Self {
            symbol,
            generated_at: Utc::now(),
            persistence: p.persistence(),
            half_life: p.half_life(),
            output,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::simulated_output;

    #[test]
    fn text_report_lists_coefficients_and_forecast() {
        let out = simulated_output();
        let text = FitReport::new("SIM", &out).to_string();
        assert!(text.contains("GARCH(1,1) VOLATILITY REPORT — SIM"));
        assert!(text.contains("alpha[1]"));
        assert!(text.contains("beta[1]"));
        assert!(text.contains("Persistence"));
        assert!(text.contains("T+5"));
        assert!(!text.contains("annualized"));
    }

    #[test]
    fn annualized_view_is_opt_in() {
        let out = simulated_output();
        let text = FitReport::new("SIM", &out).annualized(true).to_string();
        assert!(text.contains("annualized"));
    }

    #[test]
    fn json_carries_every_stage() {
        let out = simulated_output();
        let json = JsonReport::new("SIM", &out).to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["symbol"], "SIM");
        assert!(v["fit"]["model"]["params"]["alpha"].is_f64());
        assert_eq!(v["forecast"]["variance"].as_array().unwrap().len(), 5);
        assert_eq!(
            v["volatility"]["variance"].as_array().unwrap().len(),
            v["returns"]["values"].as_array().unwrap().len()
        );
    }
}
