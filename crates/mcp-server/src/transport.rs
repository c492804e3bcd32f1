//! Transports: MCP over stdio, or rmcp's streamable HTTP service mounted at `/mcp`.

use crate::CoverityServer;
use anyhow::Context as _;
use axum::Router;
use axum::routing::get;
use rmcp::ServiceExt as _;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serve one MCP session over stdin/stdout until the client disconnects or `ct` is cancelled.
///
/// # Errors
///
/// Returns an error if the session cannot be initialized or ends abnormally.
pub async fn serve_stdio(server: CoverityServer, ct: CancellationToken) -> anyhow::Result<()> {
    let running = server
        .serve(rmcp::transport::stdio())
        .await
        .context("initialize stdio session")?;
    info!("serving MCP over stdio");

    tokio::select! {
        res = running.waiting() => {
            res.context("stdio session")?;
        }
        () = ct.cancelled() => info!("shutdown requested"),
    }
    Ok(())
}

/// Router with `/mcp` (streamable HTTP) and `/health`.
pub fn http_router(server: CoverityServer, ct: &CancellationToken) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: ct.child_token(),
            ..Default::default()
        },
    );

    Router::new()
        .route("/health", get(health))
        .nest_service("/mcp", service)
}

/// Serve the HTTP router on `bind` until `ct` is cancelled.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve_http(
    server: CoverityServer,
    bind: SocketAddr,
    ct: CancellationToken,
) -> anyhow::Result<()> {
    let router = http_router(server, &ct);
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(addr = %bind, "serving MCP over streamable HTTP at /mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { ct.cancelled_owned().await })
        .await
        .context("http server")?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
