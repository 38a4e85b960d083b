//! Response types for HTTP handlers.

mod envelope;
mod errors;
mod forecasts;
mod monitors;

pub use envelope::{Envelope, REPORTING_TIMEZONE, wall_clock};
pub use errors::ErrorResponse;
pub use forecasts::ForecastResponse;
pub use monitors::MonitorStatus;
