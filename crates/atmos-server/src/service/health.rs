//! Process-wide trust flag for cached data.
//!
//! The [`HealthMonitor`] decides whether a cache read may be trusted. It starts
//! unhealthy, turns healthy once the revalidation worker completes a full cycle
//! against the cache store, and turns unhealthy again on any connectivity
//! failure observed by request handlers or the worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Tracing target for health monitor operations.
const TRACING_TARGET_HEALTH: &str = "atmos_server::service::health";

/// Sentinel for "no transition recorded yet".
const NO_TRANSITION: i64 = i64::MIN;

#[derive(Debug)]
struct HealthEntry {
    is_healthy: AtomicBool,
    transitions: AtomicU64,
    /// Milliseconds since the Unix epoch of the last transition.
    last_transition_ms: AtomicI64,
}

impl HealthEntry {
    fn new() -> Self {
        Self {
            is_healthy: AtomicBool::new(false),
            transitions: AtomicU64::new(0),
            last_transition_ms: AtomicI64::new(NO_TRANSITION),
        }
    }

    /// Stores `healthy` and returns `true` if the value changed.
    fn set(&self, healthy: bool) -> bool {
        let previous = self.is_healthy.swap(healthy, Ordering::AcqRel);
        if previous == healthy {
            return false;
        }

        self.transitions.fetch_add(1, Ordering::Relaxed);
        self.last_transition_ms
            .store(Timestamp::now().as_millisecond(), Ordering::Relaxed);
        true
    }

    fn last_transition(&self) -> Option<Timestamp> {
        match self.last_transition_ms.load(Ordering::Relaxed) {
            NO_TRANSITION => None,
            millis => Timestamp::from_millisecond(millis).ok(),
        }
    }
}

/// Point-in-time view of the health monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    /// Whether cached data may currently be trusted.
    pub healthy: bool,
    /// Number of transitions since startup.
    pub transitions: u64,
    /// When the flag last changed, if ever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition: Option<Timestamp>,
}

/// Tracks whether the cache store is reachable.
///
/// This type is `Clone` and all clones share the same flag through `Arc`.
/// Created once at startup and handed to every component that needs it.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    entry: Arc<HealthEntry>,
}

impl HealthMonitor {
    /// Creates a new monitor in the unhealthy state.
    pub fn new() -> Self {
        Self {
            entry: Arc::new(HealthEntry::new()),
        }
    }

    /// Marks the cache store as reachable.
    pub fn report_healthy(&self) {
        if self.entry.set(true) {
            tracing::info!(
                target: TRACING_TARGET_HEALTH,
                transitions = self.entry.transitions.load(Ordering::Relaxed),
                "Cache store is healthy, cached locations are trusted"
            );
        }
    }

    /// Marks the cache store as unreachable.
    pub fn report_unhealthy(&self) {
        if self.entry.set(false) {
            tracing::warn!(
                target: TRACING_TARGET_HEALTH,
                transitions = self.entry.transitions.load(Ordering::Relaxed),
                "Cache store is unhealthy, falling back to direct resolution"
            );
        }
    }

    /// Returns the current health status.
    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.entry.is_healthy.load(Ordering::Acquire)
    }

    /// Returns a snapshot for monitoring endpoints.
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            healthy: self.is_healthy(),
            transitions: self.entry.transitions.load(Ordering::Relaxed),
            last_transition: self.entry.last_transition(),
        }
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}
