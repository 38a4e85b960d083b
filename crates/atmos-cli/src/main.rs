#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use atmos_server::handler::routes;
use atmos_server::middleware::{RouterCorsExt, RouterObservabilityExt, RouterRecoveryExt};
use atmos_server::service::ServiceState;
use atmos_server::worker::WorkerHandles;
use axum::Router;

use crate::config::{Cli, MiddlewareConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "atmos_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "atmos_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "atmos_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    Cli::init_tracing();
    cli.log();
    cli.validate()?;

    let state = ServiceState::from_config(&cli.service)
        .await
        .context("failed to create service state")?;

    let workers = WorkerHandles::spawn(&state, &cli.worker);
    let state = state.with_revalidation(workers.signal());
    let router = create_router(state, &cli.middleware);

    let served = server::serve(router, cli.server.clone()).await;

    workers.shutdown();
    let stopped = tokio::time::timeout(cli.server.shutdown_timeout(), workers.wait_all()).await;
    match stopped {
        Ok(result) => result.context("revalidation worker failed")?,
        Err(_) => tracing::warn!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            timeout_secs = cli.server.shutdown_timeout,
            "Revalidation worker did not stop in time"
        ),
    }

    served.context("http server failed")?;
    Ok(())
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. CORS
/// 4. Routes (innermost) - actual request handlers
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    routes()
        .with_state(state)
        .with_cors(&middleware.cors)
        .with_observability()
        .with_recovery(&middleware.recovery)
}
