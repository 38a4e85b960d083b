//! Graceful shutdown signal handling.

use std::time::Duration;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;

/// Resolves on SIGTERM or SIGINT/Ctrl+C.
///
/// The HTTP server stops accepting connections once this resolves; the
/// revalidation worker is stopped afterwards within `shutdown_timeout`.
pub async fn shutdown_signal(shutdown_timeout: Duration) {
    let signal = tokio::select! {
        name = interrupt() => name,
        name = terminate() => name,
    };

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        signal,
        timeout_secs = shutdown_timeout.as_secs(),
        "Graceful shutdown initiated"
    );
}

async fn interrupt() -> &'static str {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "Failed to install Ctrl+C handler"
        );
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

#[cfg(unix)]
async fn terminate() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(error) => {
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                error = %error,
                "Failed to install SIGTERM handler"
            );
            std::future::pending::<()>().await;
        }
    }
    "SIGTERM"
}

#[cfg(not(unix))]
async fn terminate() -> &'static str {
    std::future::pending::<&'static str>().await
}
