//! Monitor response types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::service::HealthSnapshot;

/// Cache health status response.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    /// Timestamp when this status was generated.
    pub checked_at: Timestamp,
    /// Health monitor state.
    #[serde(flatten)]
    pub health: HealthSnapshot,
    /// Cache store backend name.
    pub cache_backend: String,
    /// Whether the revalidation worker is accepting commands.
    pub worker_connected: bool,
    /// Application version.
    pub version: String,
}

impl MonitorStatus {
    /// Creates a status from a health snapshot.
    pub fn new(health: HealthSnapshot, cache_backend: &str, worker_connected: bool) -> Self {
        Self {
            checked_at: Timestamp::now(),
            health,
            cache_backend: cache_backend.to_owned(),
            worker_connected,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
