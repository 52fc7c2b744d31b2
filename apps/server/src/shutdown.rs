use anyhow::{Context, Result};
use axum_server::Handle;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// Start draining `handle` once Ctrl+C or SIGTERM arrives.
pub(crate) fn watch(handle: Handle<SocketAddr>, grace: Duration) {
    tokio::spawn(async move {
        match wait().await {
            Ok(()) => {
                info!(grace_secs = grace.as_secs(), "Shutdown signal received, draining connections");
                handle.graceful_shutdown(Some(grace));
            },
            Err(e) => error!("Error while waiting for shutdown signal: {e:#}"),
        }
    });
}

async fn wait() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res,
        res = terminate => res,
    }
}
