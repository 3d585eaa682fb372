//! Core data structures: the daily demand series and the forecast result.

mod forecast;
mod series;

pub use forecast::{FallbackReason, Forecast, ForecastMethod};
pub use series::DemandSeries;
