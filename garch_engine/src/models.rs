pub mod garch;
pub mod likelihood;

pub use garch::{
    annualize, garch_filter, seed_variance, Distribution, FittedModel, Garch11, GarchParams,
    MeanModel, DEFAULT_VARIANCE_FLOOR, TRADING_DAYS_PER_YEAR,
};
pub use likelihood::{log_likelihood, Density};
