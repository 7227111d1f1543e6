/// series.rs — Price and return series
///
/// ─────────────────────────────────────────────────────────────────────────
/// RETURN CONSTRUCTION
/// ─────────────────────────────────────────────────────────────────────────
///
///   Simple (default):  r_t = 100 · (P_t − P_{t-1}) / P_{t-1}
///   Log:               r_t = 100 · ln(P_t / P_{t-1})
///
///   Percentage scaling keeps ω of order 1e-2 for daily equity data, which
///   keeps the likelihood surface well conditioned for the optimizer.
/// ─────────────────────────────────────────────────────────────────────────
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{GarchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Validated, chronologically ordered price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, rejecting non-positive / non-finite prices and
    /// dates that are not strictly increasing.
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        for (i, p) in points.iter().enumerate() {
            if !p.price.is_finite() || p.price <= 0.0 {
                return Err(GarchError::InvalidPrice { index: i, value: p.price });
            }
            if i > 0 && p.date <= points[i - 1].date {
                return Err(GarchError::UnorderedDates { index: i });
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnKind {
    /// Percentage change, as produced by `pct_change() * 100`.
    #[default]
    Simple,
    /// Percentage log return.
    Log,
}

/// Percentage returns, each stamped with the date of the later price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    kind: ReturnKind,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Derive returns from consecutive price pairs.
    ///
    /// Fails with `InsufficientData` when fewer than two prices are given.
    pub fn from_prices(prices: &PriceSeries, kind: ReturnKind) -> Result<Self> {
        let pts = prices.points();
        if pts.len() < 2 {
            return Err(GarchError::InsufficientData { required: 2, actual: pts.len() });
        }

        let (dates, values) = pts
            .windows(2)
            .map(|w| {
                let r = match kind {
                    ReturnKind::Simple => (w[1].price - w[0].price) / w[0].price * 100.0,
                    ReturnKind::Log => (w[1].price / w[0].price).ln() * 100.0,
                };
                (w[1].date, r)
            })
            .unzip();

        Ok(Self { kind, dates, values })
    }

    pub fn kind(&self) -> ReturnKind {
        self.kind
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ── Statistical helpers ───────────────────────────────────────────────────

pub(crate) fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance Σ(x − x̄)² / n.
pub(crate) fn population_variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}
