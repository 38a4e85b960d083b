//! Background revalidation of the location cache.
//!
//! ## Architecture
//!
//! - [`RevalidationWorker`]: the concurrent unit walking and refreshing cache
//!   entries
//! - [`ReportPump`]: logs worker reports and applies them to the health monitor
//! - [`WorkerHandles`]: spawns both, owns the command channel and shuts down
//! - [`RevalidationSignal`]: cloneable send-only handle used by request
//!   handlers to request key-driven revalidation

mod config;
mod message;
mod pump;
mod revalidation;

pub use config::RevalidationConfig;
pub use message::{CycleScope, CycleSummary, RevalidationTask, WorkerCommand, WorkerReport};
pub use pump::ReportPump;
pub use revalidation::{RevalidationWorker, WorkerState};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::service::{LocationToken, ServiceState};
use crate::{Error, Result};

/// Tracing target for worker lifecycle events.
const TRACING_TARGET: &str = "atmos_server::worker";

/// Send-only handle to the worker's command channel.
///
/// Requests never wait on the worker: commands are dropped when the channel
/// is full or the worker is gone.
#[derive(Debug, Clone, Default)]
pub struct RevalidationSignal {
    sender: Option<mpsc::Sender<WorkerCommand>>,
}

impl RevalidationSignal {
    /// A signal connected to no worker; every request is dropped.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Wraps the worker's command sender.
    pub fn new(sender: mpsc::Sender<WorkerCommand>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Returns `true` if a worker is listening.
    pub fn is_connected(&self) -> bool {
        self.sender.as_ref().is_some_and(|sender| !sender.is_closed())
    }

    /// Asks the worker to revalidate one entry. Returns `true` if queued.
    pub fn request(&self, token: LocationToken) -> bool {
        self.send(WorkerCommand::Revalidate(vec![token]))
    }

    /// Asks the worker to run a full cycle. Returns `true` if queued.
    pub fn revalidate_all(&self) -> bool {
        self.send(WorkerCommand::RevalidateAll)
    }

    fn send(&self, command: WorkerCommand) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };

        match sender.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(command)) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    ?command,
                    "Worker busy, revalidation request dropped"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Handles for the revalidation worker and its report pump.
pub struct WorkerHandles {
    worker: JoinHandle<Result<()>>,
    pump: JoinHandle<()>,
    signal: RevalidationSignal,
    cancel_token: CancellationToken,
}

impl WorkerHandles {
    /// Spawns the revalidation worker for the given state.
    ///
    /// Called exactly once at startup; the worker is never restarted.
    pub fn spawn(state: &ServiceState, config: &RevalidationConfig) -> Self {
        let cancel_token = CancellationToken::new();
        let task = RevalidationTask::default();

        let (command_tx, command_rx) = mpsc::channel(config.channel_capacity);
        let (report_tx, report_rx) = mpsc::channel(config.channel_capacity);

        tracing::info!(
            target: TRACING_TARGET,
            task = %task.name,
            worker_id = %task.worker_id,
            interval_secs = config.revalidation_interval_secs,
            recovery_interval_secs = config.recovery_interval_secs,
            failure_threshold = config.failure_threshold,
            "Starting revalidation worker"
        );

        let cache = &state.location_cache;
        let worker = RevalidationWorker::new(
            task,
            cache.store().clone(),
            state.location_service.clone(),
            cache.ttl(),
            config.clone(),
            command_rx,
            report_tx,
        );

        let worker = tokio::spawn(worker.run(cancel_token.clone()));
        let pump = ReportPump::new(report_rx, state.health.clone()).spawn();

        Self {
            worker,
            pump,
            signal: RevalidationSignal::new(command_tx),
            cancel_token,
        }
    }

    /// Returns a signal for handing to request handlers.
    pub fn signal(&self) -> RevalidationSignal {
        self.signal.clone()
    }

    /// Checks if the worker is still running.
    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }

    /// Requests graceful shutdown.
    ///
    /// The worker finishes its current cycle before stopping. When the
    /// command cannot be queued the worker is cancelled instead.
    pub fn shutdown(&self) {
        tracing::info!(
            target: TRACING_TARGET,
            "Initiating graceful shutdown of revalidation worker"
        );
        if !self.signal.send(WorkerCommand::Shutdown) {
            self.cancel_token.cancel();
        }
    }

    /// Stops the worker at its next await point.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Waits for the worker and the pump to complete.
    pub async fn wait_all(self) -> Result<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            "Waiting for revalidation worker to complete"
        );

        // Dropping the last sender held here lets the worker observe a closed channel.
        drop(self.signal);

        let (worker, pump) = tokio::join!(self.worker, self.pump);
        worker.map_err(|e| Error::internal("worker", e.to_string()))??;
        pump.map_err(|e| Error::internal("worker", e.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET,
            "Revalidation worker stopped"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::service::testing::{TestHarness, bangkok};

    #[test]
    fn disconnected_signal_drops_requests() {
        let signal = RevalidationSignal::disconnected();
        assert!(!signal.is_connected());
        assert!(!signal.request(LocationToken::new("abc123").unwrap()));
        assert!(!signal.revalidate_all());
    }

    #[tokio::test]
    async fn full_channel_drops_requests() {
        let (tx, mut rx) = mpsc::channel(1);
        let signal = RevalidationSignal::new(tx);

        assert!(signal.revalidate_all());
        assert!(!signal.revalidate_all());
        assert_eq!(rx.recv().await, Some(WorkerCommand::RevalidateAll));

        drop(rx);
        assert!(!signal.is_connected());
        assert!(!signal.revalidate_all());
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_worker_marks_cache_healthy() {
        let harness = TestHarness::new();
        let state = harness.state();
        assert!(!harness.health.is_healthy());

        let handles = WorkerHandles::spawn(&state, &RevalidationConfig::default());
        assert!(handles.signal().is_connected());

        for _ in 0..100 {
            if harness.health.is_healthy() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(harness.health.is_healthy());
        assert!(handles.is_running());

        handles.shutdown();
        handles.wait_all().await.unwrap();
        assert!(!harness.health.is_healthy());
    }

    #[tokio::test(start_paused = true)]
    async fn cache_failure_during_cycle_keeps_cache_untrusted() {
        let harness = TestHarness::new();
        harness.store.seed("bad", "Bangkok", bangkok()).await;
        harness.store.seed("good", "Bangkok", bangkok()).await;
        harness.store.fail_get_for("bad");
        let state = harness.state();

        let handles = WorkerHandles::spawn(&state, &RevalidationConfig::default());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(harness.store.gets(), 2);
        assert!(!harness.health.is_healthy());
        assert_eq!(harness.health.snapshot().transitions, 0);

        handles.cancel();
        handles.wait_all().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_command_stops_worker() {
        let harness = TestHarness::new();
        let handles = WorkerHandles::spawn(&harness.state(), &RevalidationConfig::default());
        let cancel_token = handles.cancel_token.clone();

        handles.shutdown();
        handles.wait_all().await.unwrap();
        assert!(!cancel_token.is_cancelled());
        assert!(!harness.health.is_healthy());
    }
}
