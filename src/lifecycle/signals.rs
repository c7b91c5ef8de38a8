//! OS signal handling.
//!
//! SIGINT (and SIGTERM on unix) fire the process [`Shutdown`], which in turn
//! runs the logger's flush hook.

use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;

/// Wait for an interrupt or terminate signal, then fire `shutdown`.
pub async fn shutdown_on_signal(shutdown: Shutdown) -> std::io::Result<()> {
    wait_for_signal().await?;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
    Ok(())
}

/// Spawn [`shutdown_on_signal`] on the current runtime.
pub fn spawn_signal_listener(shutdown: Shutdown) -> JoinHandle<std::io::Result<()>> {
    tokio::spawn(shutdown_on_signal(shutdown))
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
