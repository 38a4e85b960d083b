//! Cache store abstraction.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use super::{CachedLocation, LocationToken};

/// A cache operation could not reach the store or did not finish in time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cache {operation} failed: {reason}")]
pub struct ConnectivityError {
    /// The store operation that failed (`get`, `set`, ...).
    pub operation: &'static str,
    /// Human-readable cause.
    pub reason: String,
    /// Whether the failure was a timeout.
    pub timed_out: bool,
}

impl ConnectivityError {
    /// Creates a connectivity error for `operation`.
    pub fn new(operation: &'static str, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
            timed_out: false,
        }
    }

    /// Creates a timeout error for `operation`.
    pub fn timed_out(operation: &'static str, after: Duration) -> Self {
        Self {
            operation,
            reason: format!("timed out after {}ms", after.as_millis()),
            timed_out: true,
        }
    }
}

impl From<ConnectivityError> for crate::Error {
    fn from(err: ConnectivityError) -> Self {
        crate::Error::connectivity(err.to_string()).with_source(err)
    }
}

/// Key/value store for resolved locations.
///
/// Keys are the logical `location:<token>` keys; each backend decides how to
/// encode them. Last writer wins on the same key.
#[async_trait::async_trait]
pub trait CacheStore: fmt::Debug + Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Reads the entry for `token`.
    async fn get(
        &self,
        token: &LocationToken,
    ) -> Result<Option<CachedLocation>, ConnectivityError>;

    /// Writes the entry for `token`, replacing any previous value.
    async fn set(
        &self,
        token: &LocationToken,
        entry: &CachedLocation,
        ttl: Duration,
    ) -> Result<(), ConnectivityError>;

    /// Removes the entry for `token`.
    async fn delete(&self, token: &LocationToken) -> Result<(), ConnectivityError>;

    /// Lists every token that currently has an entry.
    async fn keys(&self) -> Result<Vec<LocationToken>, ConnectivityError>;

    /// Verifies the store is reachable.
    async fn ping(&self) -> Result<(), ConnectivityError>;
}

/// Runs a store operation with an upper bound on its duration.
pub(crate) async fn bounded<T, F>(
    operation: &'static str,
    limit: Duration,
    future: F,
) -> Result<T, ConnectivityError>
where
    F: Future<Output = Result<T, ConnectivityError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(ConnectivityError::timed_out(operation, limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ConnectivityError>(())
        };

        let error = bounded("get", Duration::from_millis(250), slow)
            .await
            .unwrap_err();
        assert!(error.timed_out);
        assert_eq!(error.operation, "get");
        assert_eq!(error.to_string(), "cache get failed: timed out after 250ms");
    }

    #[tokio::test]
    async fn bounded_passes_results_through() {
        let value = bounded("keys", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);

        let error = bounded::<(), _>("ping", Duration::from_secs(1), async {
            Err(ConnectivityError::new("ping", "refused"))
        })
        .await
        .unwrap_err();
        assert!(!error.timed_out);
    }

    #[test]
    fn converts_to_service_error() {
        let error = crate::Error::from(ConnectivityError::new("set", "no responders"));
        assert_eq!(error.kind(), crate::ErrorKind::Connectivity);
    }
}
