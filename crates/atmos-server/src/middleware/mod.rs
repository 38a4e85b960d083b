//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Recovery: panics, request timeouts and tower errors become envelope
//!   responses.
//! - Observability: request ids and request tracing spans.
//! - CORS for browser clients of the `GET` endpoints.
//!
//! ```rust,no_run
//! use axum::Router;
//! use atmos_server::middleware::{
//!     CorsConfig, RecoveryConfig, RouterCorsExt, RouterObservabilityExt, RouterRecoveryExt,
//! };
//!
//! let app: Router = Router::new()
//!     .with_cors(&CorsConfig::default())
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```

mod cors;
mod observability;
mod recovery;

pub use cors::{CorsConfig, RouterCorsExt};
pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
