use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::routes::{build_router, AppState};

const LOG_TARGET: &str = "server::bootstrap";

/// Binds the HTTP surface, starts the scheduler ticker, and serves until a
/// shutdown signal arrives. `World` drives its deadlines synchronously under
/// its own per-aggregate locks, so the ticker is a plain polling task rather
/// than a supervised actor.
pub async fn run_server(state: AppState, bind: SocketAddr, tick_interval: Duration) -> Result<()> {
    let ticker_state = state.clone();
    let ticker = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        loop {
            interval.tick().await;
            ticker_state.tick();
        }
    });

    let router = build_router(state);
    let listener = TcpListener::bind(bind).await.with_context(|| format!("failed to bind {bind}"))?;
    let local_addr = listener.local_addr()?;
    info!(target = LOG_TARGET, %local_addr, "wagering server listening");

    let result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error");

    ticker.abort();
    result
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target = LOG_TARGET, error = %err, "failed to install ctrl-c handler");
    }
    info!(target = LOG_TARGET, "shutdown signal received");
}
