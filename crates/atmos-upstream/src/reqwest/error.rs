//! Error types for reqwest-based upstream calls.

use thiserror::Error;

/// Result type alias for reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Upstream answered with an unexpected status.
    #[error("Unexpected status {status} from {endpoint}")]
    Status {
        status: reqwest::StatusCode,
        endpoint: &'static str,
    },
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<Error> for crate::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    crate::Error::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    crate::Error::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_decode() {
                    crate::Error::serialization()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    crate::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Status { status, endpoint } => {
                let kind = if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    crate::ErrorKind::RateLimited
                } else if status.is_server_error() {
                    crate::ErrorKind::ServiceUnavailable
                } else {
                    crate::ErrorKind::ExternalError
                };

                crate::Error::new(kind)
                    .with_message(format!("status {}", status.as_u16()))
                    .with_context(endpoint)
            }
            Error::Serde(e) => crate::Error::serialization()
                .with_message(e.to_string())
                .with_source(e),
        }
    }
}
