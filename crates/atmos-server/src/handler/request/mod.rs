//! Request types for HTTP handlers.

mod forecasts;

pub use forecasts::ForecastQuery;
