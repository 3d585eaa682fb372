//! The three cache layers.
//!
//! - [`DataCache`]: loaded tables, short TTL.
//! - [`ForecastCache`]: finished results keyed by a content hash, longer TTL.
//! - [`ModelCache`]: trained models, kept until invalidated.
//!
//! None of them is needed for correctness; every miss recomputes from
//! scratch.

mod data;
mod forecast;
mod model;
mod ttl;

pub use data::DataCache;
pub use forecast::{forecast_key, ForecastCache};
pub use model::{ModelCache, ModelEntry};
pub use ttl::TtlCache;
