//! Background revalidation of cached locations.
//!
//! The worker walks the cache store on a fixed interval, or only the keys it
//! is told about, and re-resolves every entry from the query that produced
//! it. It talks to the main process exclusively through its command and
//! report channels.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use atmos_upstream::LocationService;
use strum::{AsRefStr, Display};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{
    CycleScope, CycleSummary, RevalidationConfig, RevalidationTask, WorkerCommand, WorkerReport,
};
use crate::Result;
use crate::service::{CacheStore, CachedLocation, ConnectivityError, LocationToken, bounded};

/// Tracing target for revalidation worker operations.
const TRACING_TARGET: &str = "atmos_server::worker::revalidation";

/// Lifecycle states of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum WorkerState {
    /// Waiting for the next tick or command.
    #[default]
    Idle,
    /// Walking cache entries.
    Revalidating,
    /// Sending the outcome of a cycle.
    Reporting,
    /// Cache store unreachable; only recovery probes run.
    Paused,
}

/// A cache failure raised while a cycle runs.
#[derive(Debug)]
struct StoreFailure {
    error: ConnectivityError,
    escalate: bool,
}

/// What to do with a single entry after re-resolving it.
#[derive(Debug, PartialEq)]
enum EntryAction {
    Refresh(CachedLocation),
    Update(CachedLocation),
    Evict,
    Skip,
}

/// Cache revalidation worker.
///
/// Started once at startup and never restarted. Terminal only on
/// cancellation, a [`WorkerCommand::Shutdown`], or when every command sender
/// is gone.
pub struct RevalidationWorker {
    task: RevalidationTask,
    store: Arc<dyn CacheStore>,
    locations: LocationService,
    ttl: Duration,
    config: RevalidationConfig,
    commands: mpsc::Receiver<WorkerCommand>,
    reports: mpsc::Sender<WorkerReport>,
    state: WorkerState,
    consecutive_failures: u32,
}

impl RevalidationWorker {
    /// Create a new revalidation worker.
    pub fn new(
        task: RevalidationTask,
        store: Arc<dyn CacheStore>,
        locations: LocationService,
        ttl: Duration,
        config: RevalidationConfig,
        commands: mpsc::Receiver<WorkerCommand>,
        reports: mpsc::Sender<WorkerReport>,
    ) -> Self {
        Self {
            task,
            store,
            locations,
            ttl,
            config,
            commands,
            reports,
            state: WorkerState::Idle,
            consecutive_failures: 0,
        }
    }

    /// Run the worker until cancelled or told to shut down.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET,
            task = %self.task.name,
            worker_id = %self.task.worker_id,
            backend = self.store.backend(),
            interval_secs = self.config.revalidation_interval_secs,
            "Starting revalidation worker"
        );

        let result = self.run_inner(cancel).await;

        match &result {
            Ok(()) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    worker_id = %self.task.worker_id,
                    "Revalidation worker stopped"
                );
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    worker_id = %self.task.worker_id,
                    error = %err,
                    "Revalidation worker failed"
                );
            }
        }

        self.report(WorkerReport::Stopped).await;
        result
    }

    /// Internal run loop.
    async fn run_inner(&mut self, cancel: CancellationToken) -> Result<()> {
        self.report(WorkerReport::Started(self.task.clone())).await;

        // The first tick fires immediately, so the cache is validated once
        // before it is ever trusted.
        let mut interval = tokio::time::interval(self.config.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.state == WorkerState::Paused {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    command = self.commands.recv() => match command {
                        Some(WorkerCommand::Shutdown) | None => break,
                        Some(command) => {
                            tracing::debug!(
                                target: TRACING_TARGET,
                                ?command,
                                "Command ignored while paused"
                            );
                        }
                    },
                    _ = tokio::time::sleep(self.config.recovery_interval()) => {
                        self.probe().await;
                        // The recovery cycle replaces any tick missed while paused.
                        if self.state != WorkerState::Paused {
                            interval.reset();
                        }
                    }
                }
                continue;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(
                        target: TRACING_TARGET,
                        "Revalidation worker shutdown requested"
                    );
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(WorkerCommand::RevalidateAll) => self.cycle(None).await,
                    Some(WorkerCommand::Revalidate(tokens)) => self.cycle(Some(tokens)).await,
                    Some(WorkerCommand::Shutdown) | None => break,
                },
                _ = interval.tick() => self.cycle(None).await,
            }
        }

        Ok(())
    }

    fn set_state(&mut self, state: WorkerState) {
        if self.state != state {
            tracing::trace!(
                target: TRACING_TARGET,
                from = %self.state,
                to = %state,
                "Worker state changed"
            );
            self.state = state;
        }
    }

    async fn report(&self, report: WorkerReport) {
        if self.reports.send(report).await.is_err() {
            tracing::debug!(target: TRACING_TARGET, "Report receiver dropped");
        }
    }

    /// Runs one store operation with the worker's timeout and failure counter.
    async fn store_op<T, F>(
        &mut self,
        operation: &'static str,
        future: F,
    ) -> Result<T, StoreFailure>
    where
        F: Future<Output = Result<T, ConnectivityError>>,
    {
        match bounded(operation, self.config.store_timeout(), future).await {
            Ok(value) => {
                self.consecutive_failures = 0;
                Ok(value)
            }
            Err(error) => {
                self.consecutive_failures += 1;
                tracing::warn!(
                    target: TRACING_TARGET,
                    operation,
                    consecutive_failures = self.consecutive_failures,
                    error = %error,
                    "Cache operation failed"
                );
                Err(StoreFailure {
                    escalate: self.consecutive_failures >= self.config.failure_threshold,
                    error,
                })
            }
        }
    }

    /// Probes the store while paused.
    async fn probe(&mut self) {
        let store = self.store.clone();
        match bounded("ping", self.config.store_timeout(), store.ping()).await {
            Ok(()) => {
                self.consecutive_failures = 0;
                self.set_state(WorkerState::Idle);
                self.report(WorkerReport::ConnectivityRestored).await;
                self.cycle(None).await;
            }
            Err(error) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Cache store still unreachable"
                );
            }
        }
    }

    /// Runs a cycle over every entry, or over `tokens` when given.
    #[tracing::instrument(skip_all, target = TRACING_TARGET)]
    async fn cycle(&mut self, tokens: Option<Vec<LocationToken>>) {
        self.set_state(WorkerState::Revalidating);

        let scope = match &tokens {
            None => CycleScope::All,
            Some(tokens) => CycleScope::Keys(tokens.len()),
        };
        let mut summary = CycleSummary::new(scope);
        let started = Instant::now();

        let outcome = self.revalidate(tokens, &mut summary).await;
        summary.elapsed = started.elapsed();

        self.set_state(WorkerState::Reporting);
        match outcome {
            Ok(()) => {
                self.report(WorkerReport::CycleCompleted(summary)).await;
                self.set_state(WorkerState::Idle);
            }
            Err(StoreFailure {
                error,
                escalate: true,
            }) => {
                self.report(WorkerReport::ConnectivityLost {
                    reason: error.to_string(),
                })
                .await;
                self.set_state(WorkerState::Paused);
            }
            Err(StoreFailure { error, .. }) => {
                self.report(WorkerReport::CycleFailed {
                    reason: error.to_string(),
                    consecutive_failures: self.consecutive_failures,
                })
                .await;
                self.set_state(WorkerState::Idle);
            }
        }
    }

    async fn revalidate(
        &mut self,
        tokens: Option<Vec<LocationToken>>,
        summary: &mut CycleSummary,
    ) -> Result<(), StoreFailure> {
        let store = self.store.clone();
        let ttl = self.ttl;
        self.store_op("ping", store.ping()).await?;

        let tokens = match tokens {
            Some(tokens) => tokens,
            None => self.store_op("keys", store.keys()).await?,
        };

        for token in tokens {
            summary.scanned += 1;

            let entry = match self.store_op("get", store.get(&token)).await {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(failure) if failure.escalate => return Err(failure),
                Err(_) => {
                    summary.skipped += 1;
                    summary.cache_failures += 1;
                    continue;
                }
            };

            let action = self.decide(&token, &entry).await;
            let applied = match &action {
                EntryAction::Refresh(next) | EntryAction::Update(next) => {
                    self.store_op("set", store.set(&token, next, ttl)).await
                }
                EntryAction::Evict => self.store_op("delete", store.delete(&token)).await,
                EntryAction::Skip => Ok(()),
            };

            match (applied, action) {
                (Ok(()), EntryAction::Refresh(_)) => summary.refreshed += 1,
                (Ok(()), EntryAction::Update(_)) => summary.updated += 1,
                (Ok(()), EntryAction::Evict) => summary.evicted += 1,
                (Ok(()), EntryAction::Skip) => summary.skipped += 1,
                (Err(failure), _) if failure.escalate => return Err(failure),
                (Err(_), _) => {
                    summary.skipped += 1;
                    summary.cache_failures += 1;
                }
            }
        }

        Ok(())
    }

    /// Re-resolves an entry and decides how to update it.
    async fn decide(&self, token: &LocationToken, entry: &CachedLocation) -> EntryAction {
        if !entry.is_current_version() || entry.is_expired() {
            tracing::debug!(
                target: TRACING_TARGET,
                key = %token.cache_key(),
                "Evicting expired entry"
            );
            return EntryAction::Evict;
        }

        match self.locations.resolve(&entry.query).await {
            Ok(Some(record)) if record == entry.record => {
                EntryAction::Refresh(entry.refreshed(self.ttl))
            }
            Ok(Some(record)) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    key = %token.cache_key(),
                    query = %entry.query,
                    location_id = %record.location_id,
                    "Cached location changed upstream"
                );
                EntryAction::Update(entry.updated(record, self.ttl))
            }
            Ok(None) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    key = %token.cache_key(),
                    query = %entry.query,
                    "Cached location no longer resolves"
                );
                EntryAction::Evict
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    key = %token.cache_key(),
                    query = %entry.query,
                    error = %error,
                    "Revalidation lookup failed, entry kept"
                );
                EntryAction::Skip
            }
        }
    }
}
