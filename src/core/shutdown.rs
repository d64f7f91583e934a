//! # OS termination signals.
//!
//! Both the master and every worker stop on the same set of signals:
//!
//! - Unix: `SIGINT`, `SIGTERM`, `SIGQUIT`
//! - elsewhere: Ctrl-C only
//!
//! A worker additionally stops on a `Terminate` directive or when its control
//! channel closes; see [`WorkerRuntime`](crate::WorkerRuntime).

/// Completes when the process receives a termination signal.
///
/// Every call registers its own listeners. Fails only if registration fails.
#[cfg(unix)]
pub async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = interrupt.recv() => {},
        _ = terminate.recv() => {},
        _ = quit.recv() => {},
    }
    Ok(())
}

/// Completes when the process receives Ctrl-C.
#[cfg(not(unix))]
pub async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
