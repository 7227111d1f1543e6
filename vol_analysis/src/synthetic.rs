/// synthetic.rs — Price path from simulated percentage returns
///
///   P_0 = 100
///   Simple:  P_t = P_{t-1} · (1 + r_t / 100)
///   Log:     P_t = P_{t-1} · exp(r_t / 100)
///
/// so that building returns of the same kind from the prices gives r back.
/// Dates advance one calendar day per step.
use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};

use garch_engine::{PricePoint, PriceSeries, ReturnKind};

pub const BASE_PRICE: f64 = 100.0;

pub fn compound_prices(returns: &[f64], kind: ReturnKind, start: NaiveDate) -> Result<PriceSeries> {
    let mut points = Vec::with_capacity(returns.len() + 1);
    let mut price = BASE_PRICE;
    points.push(PricePoint { date: start, price });

    let mut date = start;
    for r in returns {
        date = date
            .checked_add_days(Days::new(1))
            .context("synthetic date range overflow")?;
        price *= match kind {
            ReturnKind::Simple => 1.0 + r / 100.0,
            ReturnKind::Log => (r / 100.0).exp(),
        };
        points.push(PricePoint { date, price });
    }
    PriceSeries::new(points).context("simulated path produced an invalid price")
}
