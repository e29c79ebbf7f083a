use tokio_util::sync::CancellationToken;

/// Install a shutdown handler that listens for Ctrl-C and, on unix, SIGTERM.
///
/// Returns a `CancellationToken` that is cancelled when either signal is received. The HTTP
/// server drains on it and every processing session derives its own token from it.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = interrupt() => {
                tracing::info!("Received SIGINT, initiating graceful shutdown");
            }
            _ = terminate() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
        }

        token_clone.cancel();
    });

    token
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install SIGINT handler: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::error!("Failed to install SIGTERM handler: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
