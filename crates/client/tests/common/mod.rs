use coverity_connect_client::{ConnectionConfig, CoverityClient};
use std::time::Duration;

pub use coverity_mock_server::MockServer;
pub use coverity_test_support::{MockHandle, spawn_mock};

pub const USER: &str = "mock_user";
pub const KEY: &str = "mock_key";

pub fn client_for(port: u16, username: &str, secret: &str) -> anyhow::Result<CoverityClient> {
    let cfg = ConnectionConfig::new("127.0.0.1", port, false, username, secret)
        .with_timeout(Duration::from_secs(5));
    Ok(CoverityClient::new(&cfg)?)
}

pub async fn authed_mock() -> anyhow::Result<(MockHandle, CoverityClient)> {
    let mock = spawn_mock(MockServer::with_credentials(USER, KEY)).await?;
    let client = client_for(mock.port(), USER, KEY)?;
    Ok((mock, client))
}
