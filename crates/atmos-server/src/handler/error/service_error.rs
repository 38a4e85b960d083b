//! Service error to HTTP error conversion.

use super::http_error::{Error as HttpError, ErrorKind};
use crate::ErrorKind as ServiceErrorKind;

/// Tracing target for service error conversions.
const TRACING_TARGET: &str = "atmos_server::handler::service";

impl From<crate::Error> for HttpError<'static> {
    fn from(error: crate::Error) -> Self {
        let kind = match error.kind() {
            ServiceErrorKind::LocationNotFound => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Location not found"
                );
                ErrorKind::LocationNotFound
            }
            ServiceErrorKind::UpstreamFetch | ServiceErrorKind::Connectivity => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind(),
                    "Upstream request failed"
                );
                ErrorKind::FetchFailed
            }
            ServiceErrorKind::Config | ServiceErrorKind::Internal => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind(),
                    "Service operation failed"
                );
                ErrorKind::InternalServerError
            }
        };

        kind.with_context(error.message().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_http_kinds() {
        let cases = [
            (crate::Error::location_not_found("x"), ErrorKind::LocationNotFound),
            (crate::Error::upstream_fetch("weather", "x"), ErrorKind::FetchFailed),
            (crate::Error::connectivity("x"), ErrorKind::FetchFailed),
            (crate::Error::internal("worker", "x"), ErrorKind::InternalServerError),
        ];

        for (error, expected) in cases {
            assert_eq!(HttpError::from(error).kind(), expected);
        }
    }
}
