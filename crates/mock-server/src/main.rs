//! Standalone mock Coverity Connect server.

use anyhow::Context as _;
use clap::Parser;
use coverity_mock_server::MockServer;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "coverity-mock-server", version, about = "Canned Coverity Connect server")]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "COVERITY_MOCK_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Require HTTP basic auth with this username on `/api/*`
    #[arg(long, requires = "password")]
    username: Option<String>,

    /// Password paired with `--username`
    #[arg(long, requires = "username")]
    password: Option<String>,

    /// Log level filter (e.g. info, debug)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(cli.log_level.to_ascii_lowercase())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let server = match (cli.username, cli.password) {
        (Some(u), Some(p)) => MockServer::with_credentials(u, p),
        _ => MockServer::new(),
    };

    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("bind {}", cli.bind))?;
    info!(addr = %cli.bind, "mock Coverity Connect server listening");
    info!(
        "point the MCP server at it with COVERITY_HOST={} COVERITY_PORT={} COVERITY_SSL=false",
        cli.bind.ip(),
        cli.bind.port()
    );

    server
        .serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("serve")?;

    info!("mock server stopped");
    Ok(())
}
