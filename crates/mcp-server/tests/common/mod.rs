#![allow(dead_code)]

use anyhow::Context as _;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

pub use coverity_mock_server::MockServer;
pub use coverity_test_support::{KillOnDrop, MockHandle, spawn_mock};

pub const USER: &str = "mock_user";
pub const KEY: &str = "mock_key";

pub fn pick_unused_port() -> anyhow::Result<u16> {
    coverity_test_support::pick_unused_port()
}

pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    coverity_test_support::wait_http_ok(url, timeout_dur).await
}

pub const BIN: &str = env!("CARGO_BIN_EXE_coverity-mcp-server");

/// Inputs that could leak in from the developer's shell.
const SCRUBBED_ENV: &[&str] = &[
    "COVERITY_HOST",
    "COVERITY_PORT",
    "COVERITY_SSL",
    "COVAUTHUSER",
    "COVAUTHKEY",
    "PROXY_HOST",
    "PROXY_PORT",
    "PROXY_USER",
    "PROXY_PASS",
    "COVERITY_CA_CERT",
    "COVERITY_TIMEOUT_SECS",
    "COVERITY_MCP_TRANSPORT",
    "COVERITY_MCP_BIND",
    "RUST_LOG",
];

/// Base command with a scrubbed environment pointing at a mock on `mock_port`.
pub fn command_for_mock(mock_port: u16, secret: &str) -> Command {
    let mut cmd = Command::new(BIN);
    for name in SCRUBBED_ENV {
        cmd.env_remove(name);
    }
    cmd.env("COVERITY_HOST", "127.0.0.1")
        .env("COVERITY_PORT", mock_port.to_string())
        .env("COVERITY_SSL", "false")
        .env("COVAUTHUSER", USER)
        .env("COVAUTHKEY", secret)
        .env("LOG_LEVEL", "info")
        .current_dir(env!("CARGO_TARGET_TMPDIR"));
    cmd
}

pub fn spawn_http_server(mock_port: u16, port: u16) -> anyhow::Result<Child> {
    command_for_mock(mock_port, KEY)
        .arg("--transport")
        .arg("http")
        .arg("--bind")
        .arg(format!("127.0.0.1:{port}"))
        .stdout(Stdio::null())
        .spawn()
        .context("spawn coverity-mcp-server")
}

/// Mock with credentials plus an MCP server on HTTP in front of it.
pub async fn start_stack() -> anyhow::Result<(MockHandle, String, KillOnDrop)> {
    let mock = spawn_mock(MockServer::with_credentials(USER, KEY)).await?;
    let port = pick_unused_port()?;
    let child = KillOnDrop(spawn_http_server(mock.port(), port)?);

    let base_url = format!("http://127.0.0.1:{port}");
    wait_http_ok(&format!("{base_url}/health"), Duration::from_secs(20)).await?;
    Ok((mock, base_url, child))
}
