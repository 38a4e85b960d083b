use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::Envelope;

/// Tracing target for error responses.
const TRACING_TARGET: &str = "atmos_server::handler::response";

/// HTTP error response representation.
///
/// Only `message` reaches the client, wrapped in an [`Envelope`] with
/// `data: null`. The name and context are logged.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone)]
pub struct ErrorResponse<'a> {
    /// The error name/type identifier
    pub name: Cow<'a, str>,
    /// Message safe for client display
    pub message: Cow<'a, str>,
    /// Internal context for debugging
    pub context: Option<Cow<'a, str>>,
    /// HTTP status code
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    // 4xx Client Errors
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        "Invalid request parameters",
        StatusCode::BAD_REQUEST,
    );
    pub const LOCATION_NOT_FOUND: Self = Self::new(
        "location_not_found",
        "Location not found",
        StatusCode::NOT_FOUND,
    );
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        "The requested resource was not found",
        StatusCode::NOT_FOUND,
    );
    pub const REQUEST_TIMEOUT: Self = Self::new(
        "request_timeout",
        "The request took too long to process",
        StatusCode::REQUEST_TIMEOUT,
    );

    // 5xx Server Errors
    pub const FETCH_FAILED: Self = Self::new(
        "fetch_failed",
        "Error fetching data",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "An internal server error occurred. Please try again later",
        StatusCode::INTERNAL_SERVER_ERROR,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'a str, message: &'a str, status: StatusCode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            context: None,
            status,
        }
    }

    /// Replaces the client-facing message.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.message = message.into();
        self
    }

    /// Attaches context to the error response.
    /// If context already exists, it merges them with a separator.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        let new_context = context.into();
        self.context = Some(match self.context {
            Some(existing) => Cow::Owned(format!("{}; {}", existing, new_context)),
            None => new_context,
        });
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    fn into_response(self) -> Response {
        tracing::debug!(
            target: TRACING_TARGET,
            name = %self.name,
            status = self.status.as_u16(),
            context = self.context.as_deref().unwrap_or_default(),
            "Responding with error"
        );

        let envelope = Envelope::failure(self.message.into_owned());
        (self.status, Json(envelope)).into_response()
    }
}
