//! Background worker. No jobs are scheduled yet; the process idles with a
//! heartbeat until it is told to stop.

use std::future::Future;
use std::time::Duration;
use tokio::signal;
use tracing_subscriber::EnvFilter;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Worker started - idle mode");
    let beats = run(HEARTBEAT_INTERVAL, shutdown_signal()).await;
    tracing::info!(heartbeats = beats, "Worker shutting down");
    Ok(())
}

/// Tick every `interval` until `shutdown` resolves. Returns the number of heartbeats.
async fn run(interval: Duration, shutdown: impl Future<Output = ()>) -> u64 {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    let mut beats = 0;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => return beats,
            _ = ticker.tick() => {
                beats += 1;
                tracing::debug!(beats, "Worker heartbeat - still idle");
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
