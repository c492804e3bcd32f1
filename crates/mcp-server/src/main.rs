use anyhow::Context as _;
use clap::Parser;
use coverity_connect_client::{CoverityApi, CoverityClient, Settings};
use coverity_mcp_server::CoverityServer;
use coverity_mcp_server::cli::{Cli, Command, LogFormat, Transport};
use coverity_mcp_server::transport::{serve_http, serve_stdio};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Variables already in the environment win over `.env`.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }

    let config = cli
        .apply(Settings::from_env())
        .into_config()
        .inspect_err(|e| error!(error = %e, "invalid configuration"))?;
    info!(
        server = %config.server_url(),
        username = %config.username,
        proxy = config.proxy.is_some(),
        timeout_secs = config.timeout.as_secs(),
        "coverity connection configured"
    );

    let client: Arc<dyn CoverityApi> =
        Arc::new(CoverityClient::new(&config).context("build Coverity client")?);

    if cli.command == Some(Command::Check) {
        return check(client.as_ref(), &config.server_url()).await;
    }

    let ct = CancellationToken::new();
    tokio::spawn({
        let ct = ct.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("ctrl-c received, shutting down");
            }
            ct.cancel();
        }
    });

    let server = CoverityServer::new(client);
    match cli.transport {
        Transport::Stdio => serve_stdio(server, ct).await,
        Transport::Http => serve_http(server, cli.bind, ct).await,
    }
}

async fn check(api: &dyn CoverityApi, server_url: &str) -> anyhow::Result<()> {
    let projects = api
        .list_projects()
        .await
        .inspect_err(|e| error!(kind = e.kind(), error = %e, "connection check failed"))?;
    println!("connected to {server_url}: {} projects", projects.len());
    Ok(())
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_ascii_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
