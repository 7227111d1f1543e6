pub mod error;
pub mod series;
pub mod models;
pub mod optimizer;
pub mod estimator;
pub mod inference;
pub mod reconstruct;
pub mod forecast;
pub mod simulate;
pub mod pipeline;

pub use error::{GarchError, Result};
pub use estimator::{EstimatorConfig, FitDiagnostics, GarchEstimator, GarchFit};
pub use forecast::{forecast, forecast_variance, VolatilityForecast};
pub use inference::{parameter_inference, ParameterEstimate, ParameterInference};
pub use models::*;
pub use pipeline::{PipelineOutput, VolatilityPipeline};
pub use reconstruct::{reconstruct, ConditionalVolatility};
pub use series::{PricePoint, PriceSeries, ReturnKind, ReturnSeries};
pub use simulate::GarchSimulator;
