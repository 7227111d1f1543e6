/// error.rs — Failure kinds of the volatility engine
///
/// Every stage either returns its full output or one of these values; no
/// stage ever hands back a partially filled series.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GarchError {
    /// Series shorter than the operation needs.
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The optimizer ran out of budget or never found a finite objective.
    #[error("optimization diverged after {iterations} iterations: {reason}")]
    OptimizationDivergence { iterations: usize, reason: String },

    #[error("invalid forecast horizon {0}: must be at least 1")]
    InvalidHorizon(usize),

    /// Variance overflow / NaN that flooring could not absorb.
    #[error("numerical instability at t={index}: {reason}")]
    NumericalInstability { index: usize, reason: String },

    #[error("invalid GARCH parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid price {value} at index {index}: prices must be positive and finite")]
    InvalidPrice { index: usize, value: f64 },

    #[error("dates must be strictly increasing (violated at index {index})")]
    UnorderedDates { index: usize },
}

pub type Result<T> = std::result::Result<T, GarchError>;
