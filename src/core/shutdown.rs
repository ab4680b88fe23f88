//! # OS termination signals as a shutdown request.
//!
//! The pipeline itself never decides to exit; termination comes from the
//! operator. [`wait_for_shutdown_signal`] completes on:
//!
//! - **Unix**: `SIGINT`, `SIGTERM`, `SIGQUIT`
//! - **Elsewhere**: Ctrl-C via [`tokio::signal::ctrl_c`]

/// Waits for a termination signal.
///
/// Returns `Err` if the signal listeners cannot be registered.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Err` if the signal listener cannot be registered.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
