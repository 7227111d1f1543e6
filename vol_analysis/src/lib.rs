/// lib.rs — Volatility analysis application
///
/// Fetches daily index prices, runs the GARCH(1,1) pipeline from
/// `garch_engine`, and renders / exports the results.

pub mod config;
pub mod export;
pub mod fetch;
pub mod report;
pub mod synthetic;
