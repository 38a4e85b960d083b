//! Main-process side of the worker's report channel.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::WorkerReport;
use crate::service::HealthMonitor;

/// Tracing target for worker status messages.
const TRACING_TARGET: &str = "atmos_server::worker::report";

/// Drains worker reports, logs them and applies them to the health monitor.
///
/// Only a completed cycle in which the store answered every operation marks
/// the cache healthy. Any cache failure the worker saw, lost connectivity or
/// a stopped worker marks it unhealthy.
pub struct ReportPump {
    reports: mpsc::Receiver<WorkerReport>,
    health: HealthMonitor,
}

impl ReportPump {
    /// Create a new pump.
    pub fn new(reports: mpsc::Receiver<WorkerReport>, health: HealthMonitor) -> Self {
        Self { reports, health }
    }

    /// Spawns the pump; it ends once the worker drops its report sender.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until the report channel closes.
    pub async fn run(mut self) {
        while let Some(report) = self.reports.recv().await {
            self.apply(&report);
        }
    }

    fn apply(&self, report: &WorkerReport) {
        match report {
            WorkerReport::CycleCompleted(summary) if summary.store_answered() => {
                tracing::info!(target: TRACING_TARGET, "Revalidate worker: {report}");
                self.health.report_healthy();
            }
            WorkerReport::CycleCompleted(_) => {
                tracing::warn!(target: TRACING_TARGET, "Revalidate worker: {report}");
                self.health.report_unhealthy();
            }
            WorkerReport::ConnectivityLost { .. } => {
                tracing::warn!(target: TRACING_TARGET, "Revalidate worker: {report}");
                self.health.report_unhealthy();
            }
            WorkerReport::Stopped => {
                tracing::info!(target: TRACING_TARGET, "Revalidate worker: {report}");
                self.health.report_unhealthy();
            }
            WorkerReport::CycleFailed { .. } => {
                tracing::warn!(target: TRACING_TARGET, "Revalidate worker: {report}");
                self.health.report_unhealthy();
            }
            WorkerReport::Started(_) | WorkerReport::ConnectivityRestored => {
                tracing::info!(target: TRACING_TARGET, "Revalidate worker: {report}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{CycleScope, CycleSummary, RevalidationTask};

    #[tokio::test]
    async fn applies_reports_to_health() {
        let health = HealthMonitor::new();
        let (tx, rx) = mpsc::channel(8);
        let pump = ReportPump::new(rx, health.clone()).spawn();

        tx.send(WorkerReport::Started(RevalidationTask::default()))
            .await
            .unwrap();
        tx.send(WorkerReport::ConnectivityRestored).await.unwrap();
        tx.send(WorkerReport::CycleCompleted(CycleSummary::new(CycleScope::All)))
            .await
            .unwrap();
        tx.send(WorkerReport::CycleFailed {
            reason: "cache ping failed: refused".to_owned(),
            consecutive_failures: 1,
        })
        .await
        .unwrap();
        drop(tx);
        pump.await.unwrap();

        // A cycle aborted by a cache failure revokes trust even below the
        // pause threshold.
        assert!(!health.is_healthy());
        assert_eq!(health.snapshot().transitions, 2);
    }

    #[tokio::test]
    async fn completed_cycle_with_cache_failures_is_untrusted() {
        let health = HealthMonitor::new();
        let (tx, rx) = mpsc::channel(8);
        let pump = ReportPump::new(rx, health.clone()).spawn();

        let mut summary = CycleSummary::new(CycleScope::All);
        summary.scanned = 2;
        summary.refreshed = 1;
        summary.skipped = 1;
        summary.cache_failures = 1;
        tx.send(WorkerReport::CycleCompleted(summary)).await.unwrap();
        drop(tx);
        pump.await.unwrap();

        assert!(!health.is_healthy());
        assert_eq!(health.snapshot().transitions, 0);
    }

    #[tokio::test]
    async fn connectivity_loss_and_stop_revoke_trust() {
        for last in [
            WorkerReport::ConnectivityLost {
                reason: "cache keys failed: timed out after 2000ms".to_owned(),
            },
            WorkerReport::Stopped,
        ] {
            let health = HealthMonitor::new();
            let (tx, rx) = mpsc::channel(8);
            let pump = ReportPump::new(rx, health.clone()).spawn();

            tx.send(WorkerReport::CycleCompleted(CycleSummary::new(CycleScope::All)))
                .await
                .unwrap();
            tx.send(last).await.unwrap();
            drop(tx);
            pump.await.unwrap();

            assert!(!health.is_healthy());
            assert_eq!(health.snapshot().transitions, 2);
        }
    }
}
