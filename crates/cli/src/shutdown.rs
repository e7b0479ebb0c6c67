use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancels `cancel` on SIGINT or SIGTERM. The running sync stops at its next
/// page boundary, so rerunning the job resumes where it stopped.
pub fn cancel_on_signal(cancel: CancellationToken) {
    tokio::spawn(async move {
        let received = tokio::select! {
            _ = interrupted() => "SIGINT",
            _ = terminated() => "SIGTERM",
        };
        info!(signal = received, "Stopping after the current page");
        cancel.cancel();
    });
}

async fn interrupted() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "SIGINT handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminated() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!(error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminated() {
    std::future::pending::<()>().await;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    Failed = 1,
    /// Same code a shell reports for a SIGINT'd process.
    Interrupted = 130,
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status as u8)
    }
}
