//! Messages exchanged between the main process and the revalidation worker.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use uuid::Uuid;

use crate::service::LocationToken;

/// Unit of work dispatched to the worker once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevalidationTask {
    /// Task name, used in logs.
    pub name: Cow<'static, str>,
    /// Identifier of the worker running the task.
    pub worker_id: String,
}

impl RevalidationTask {
    /// Name of the default task.
    pub const DEFAULT_NAME: &'static str = "cache-revalidation";

    /// Creates a task.
    pub fn new(name: impl Into<Cow<'static, str>>, worker_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            worker_id: worker_id.into(),
        }
    }
}

impl Default for RevalidationTask {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME, "1")
    }
}

/// Main process to worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Run a full cycle now.
    RevalidateAll,
    /// Revalidate only these entries.
    Revalidate(Vec<LocationToken>),
    /// Stop after the current step.
    Shutdown,
}

/// Which entries a cycle covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleScope {
    /// Every stored entry.
    All,
    /// A key-driven cycle over this many requested entries.
    Keys(usize),
}

impl fmt::Display for CycleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("full"),
            Self::Keys(count) => write!(f, "{count} key(s)"),
        }
    }
}

/// Outcome counters of one revalidation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    pub scope: CycleScope,
    /// Entries looked at.
    pub scanned: usize,
    /// Unchanged entries whose deadline was pushed back.
    pub refreshed: usize,
    /// Entries whose record changed upstream.
    pub updated: usize,
    /// Entries removed because they expired or no longer resolve.
    pub evicted: usize,
    /// Entries left untouched after a failed resolution or cache operation.
    pub skipped: usize,
    /// Cache operations that failed or timed out below the pause threshold.
    pub cache_failures: usize,
    pub elapsed: Duration,
}

impl CycleSummary {
    /// Creates an empty summary for a new cycle.
    pub fn new(scope: CycleScope) -> Self {
        Self {
            cycle_id: Uuid::now_v7(),
            scope,
            scanned: 0,
            refreshed: 0,
            updated: 0,
            evicted: 0,
            skipped: 0,
            cache_failures: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Returns `true` if the store answered every operation of the cycle.
    #[inline]
    pub fn store_answered(&self) -> bool {
        self.cache_failures == 0
    }
}

/// Worker to main process.
///
/// Each report renders to the free-form status line logged by the
/// [`ReportPump`](super::ReportPump).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerReport {
    /// The worker picked up its task.
    Started(RevalidationTask),
    /// A cycle ran to completion; see [`CycleSummary::store_answered`].
    CycleCompleted(CycleSummary),
    /// A cycle was abandoned after a cache failure below the pause threshold.
    CycleFailed {
        reason: String,
        consecutive_failures: u32,
    },
    /// Repeated cache failures; the worker is paused until the store answers.
    ConnectivityLost { reason: String },
    /// The store answered a recovery probe; a full cycle follows.
    ConnectivityRestored,
    /// The worker exited.
    Stopped,
}

impl fmt::Display for WorkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started(task) => write!(
                f,
                "started task '{}' (worker {})",
                task.name, task.worker_id
            ),
            Self::CycleCompleted(summary) => write!(
                f,
                "{} cycle {} finished in {}ms: scanned {}, refreshed {}, updated {}, evicted {}, skipped {}, cache failures {}",
                summary.scope,
                summary.cycle_id,
                summary.elapsed.as_millis(),
                summary.scanned,
                summary.refreshed,
                summary.updated,
                summary.evicted,
                summary.skipped,
                summary.cache_failures,
            ),
            Self::CycleFailed {
                reason,
                consecutive_failures,
            } => write!(
                f,
                "cycle aborted ({consecutive_failures} consecutive cache failure(s)): {reason}"
            ),
            Self::ConnectivityLost { reason } => {
                write!(f, "cache store unreachable, pausing: {reason}")
            }
            Self::ConnectivityRestored => f.write_str("cache store reachable again, resuming"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}
