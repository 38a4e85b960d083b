//! HTTP server startup.

use std::io;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::time::Instant;

use super::shutdown_signal;
use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Binds the configured address and serves `app` until a shutdown signal.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(app: Router, server_config: ServerConfig) -> io::Result<()> {
    let addr = server_config.server_addr();
    let listener = TcpListener::bind(addr)
        .await
        .inspect_err(|err| log_io_failure("Failed to bind gateway address", addr, err))?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %addr,
        "Gateway listening"
    );

    let started = Instant::now();
    let shutdown = shutdown_signal(server_config.shutdown_timeout());
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .inspect_err(|err| log_io_failure("Gateway stopped with an error", addr, err))?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        uptime_secs = started.elapsed().as_secs(),
        "Gateway stopped accepting requests"
    );
    Ok(())
}

fn log_io_failure(message: &str, addr: SocketAddr, err: &io::Error) {
    tracing::error!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %addr,
        error = %err,
        hint = bind_hint(err.kind()),
        "{message}"
    );
}

/// Operator hint for the socket errors worth explaining.
fn bind_hint(kind: io::ErrorKind) -> &'static str {
    match kind {
        io::ErrorKind::AddrInUse => "another process holds this port; set PORT",
        io::ErrorKind::PermissionDenied => "ports below 1024 need elevated privileges",
        io::ErrorKind::AddrNotAvailable => "HOST is not an address of this machine",
        _ => "",
    }
}
