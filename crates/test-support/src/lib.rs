use anyhow::Context as _;
use coverity_mock_server::MockServer;
use std::net::{SocketAddr, TcpListener};
use std::process::Child;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
    }
}

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; it's still possible for another process to bind it
/// before you do.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails or if the bound socket's
/// local address cannot be read.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Poll an HTTP URL until it returns a success status (2xx/3xx).
///
/// # Errors
///
/// Returns an error if the timeout elapses before the endpoint returns a success status.
pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout_dur {
            anyhow::bail!("timed out waiting for {url}");
        }

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(200)).await,
        }
    }
}

/// A mock Coverity Connect server running on an ephemeral localhost port.
///
/// The server shuts down when the handle is dropped.
pub struct MockHandle {
    pub server: MockServer,
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockHandle {
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Start `server` in-process on the current tokio runtime.
///
/// # Errors
///
/// Returns an error if no localhost port can be bound.
pub async fn spawn_mock(server: MockServer) -> anyhow::Result<MockHandle> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind mock listener")?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(server.clone().serve(listener, async move {
        let _ = rx.await;
    }));

    Ok(MockHandle {
        server,
        addr,
        shutdown: Some(tx),
    })
}
