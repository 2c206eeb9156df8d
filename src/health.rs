use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Liveness endpoint for hosting platforms that check the process over HTTP.
/// It shares nothing with the poll loop.
pub fn router() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/healthz", get(health))
}

async fn health() -> &'static str {
    "ok"
}

pub async fn serve_on(listener: TcpListener) -> Result<()> {
    axum::serve(listener, router())
        .await
        .context("liveness server failed")
}

pub async fn serve(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind liveness endpoint on {}", addr))?;
    tracing::info!(%addr, "Liveness endpoint listening");
    serve_on(listener).await
}

/// Run the liveness endpoint on its own task. Failures are logged and never reach the caller.
pub fn spawn(port: u16) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(port).await {
            tracing::error!(port, error = %format!("{:#}", e), "Liveness endpoint stopped");
        }
    })
}
