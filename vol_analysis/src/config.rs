/// config.rs — Run configuration loaded from .env
///
/// Every knob has a default; command-line flags override whatever is
/// loaded here.
use anyhow::Result;
use chrono::NaiveDate;
use clap::ValueEnum;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use garch_engine::{Distribution, EstimatorConfig, MeanModel, ReturnKind, DEFAULT_VARIANCE_FLOOR};

pub const DEFAULT_SYMBOL: &str = "^GSPC";
pub const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) vol_analysis/0.1";

// ── CLI / env enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DistributionArg {
    Normal,
    #[value(name = "student-t", alias = "t")]
    StudentT,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MeanArg {
    Zero,
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReturnKindArg {
    Simple,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }
}

macro_rules! value_enum_from_str {
    ($($t:ty),*) => {$(
        impl FromStr for $t {
            type Err = String;
            fn from_str(s: &str) -> std::result::Result<Self, String> {
                <Self as ValueEnum>::from_str(s, true)
            }
        }
    )*};
}
value_enum_from_str!(DistributionArg, MeanArg);

impl From<DistributionArg> for Distribution {
    fn from(d: DistributionArg) -> Self {
        match d {
            DistributionArg::Normal => Distribution::Normal,
            DistributionArg::StudentT => Distribution::StudentT,
        }
    }
}

impl From<MeanArg> for MeanModel {
    fn from(m: MeanArg) -> Self {
        match m {
            MeanArg::Zero => MeanModel::Zero,
            MeanArg::Constant => MeanModel::Constant,
        }
    }
}

impl From<ReturnKindArg> for ReturnKind {
    fn from(k: ReturnKindArg) -> Self {
        match k {
            ReturnKindArg::Simple => ReturnKind::Simple,
            ReturnKindArg::Log => ReturnKind::Log,
        }
    }
}

// ── AppConfig ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AppConfig {
    // ── Data source ──────────────────────────────────────────────────
    pub symbol: String,
    /// First date requested from the price source
    pub start: NaiveDate,

    // ── Model / estimation ───────────────────────────────────────────
    /// Forecast horizon in trading days
    pub horizon: usize,
    pub min_observations: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub variance_floor: f64,
    pub distribution: DistributionArg,
    pub mean: MeanArg,

    // ── Yahoo Finance ────────────────────────────────────────────────
    pub yahoo_base_url: String,
    pub yahoo_user_agent: String,
    /// Attempts after an HTTP 429 before giving up
    pub yahoo_max_retries: u32,

    // ── Output ───────────────────────────────────────────────────────
    pub output_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // ignore missing .env
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_start = NaiveDate::from_ymd_opt(2010, 1, 1)
            .ok_or_else(|| anyhow::anyhow!("invalid default start date"))?;

        Ok(Self {
            symbol: lookup("GARCH_SYMBOL").unwrap_or_else(|| DEFAULT_SYMBOL.into()),
            start: parse_env(&lookup, "GARCH_START", default_start)?,

            horizon:          parse_env(&lookup, "GARCH_HORIZON",        5usize)?,
            min_observations: parse_env(&lookup, "GARCH_MIN_OBS",        30usize)?,
            max_iterations:   parse_env(&lookup, "GARCH_MAX_ITERS",      10_000usize)?,
            tolerance:        parse_env(&lookup, "GARCH_TOLERANCE",      1e-8)?,
            variance_floor:   parse_env(&lookup, "GARCH_VARIANCE_FLOOR", DEFAULT_VARIANCE_FLOOR)?,
            distribution:     parse_env(&lookup, "GARCH_DISTRIBUTION",   DistributionArg::Normal)?,
            mean:             parse_env(&lookup, "GARCH_MEAN",           MeanArg::Zero)?,

            yahoo_base_url:   lookup("YAHOO_BASE_URL").unwrap_or_else(|| DEFAULT_YAHOO_URL.into()),
            yahoo_user_agent: lookup("YAHOO_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.into()),
            yahoo_max_retries: parse_env(&lookup, "YAHOO_MAX_RETRIES", 3u32)?,

            output_dir: lookup("GARCH_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output")),
        })
    }

    /// Estimator settings implied by this configuration.
    pub fn estimator(&self) -> EstimatorConfig {
        EstimatorConfig {
            min_observations: self.min_observations,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            variance_floor: self.variance_floor,
            distribution: self.distribution.into(),
            mean: self.mean.into(),
            ..EstimatorConfig::default()
        }
    }
}

fn parse_env<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr + Copy,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Config key {key}: {e}")),
        None => Ok(default),
    }
}
