use anyhow::Context as _;
use futures::StreamExt as _;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::io::AsyncBufReadExt as _;
use tokio_util::io::StreamReader;

/// Minimal MCP client for the server's streamable HTTP endpoint (`/mcp`). Test-only.
pub struct McpStreamableHttpSession {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
    next_id: std::sync::atomic::AtomicU64,
}

impl McpStreamableHttpSession {
    pub async fn connect(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();

        let init_resp = post_mcp(
            &client,
            &base_url,
            None,
            json!({
                "jsonrpc": "2.0",
                "id": 0,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "coverity-mcp-integration-tests", "version": "0" }
                }
            }),
        )
        .await?;

        let session_id = init_resp
            .headers()
            .get("Mcp-Session-Id")
            .and_then(|h| h.to_str().ok())
            .context("missing Mcp-Session-Id header")?
            .to_string();

        let init_msg = read_json_message(init_resp).await?;
        anyhow::ensure!(init_msg.get("id") == Some(&json!(0)), "unexpected init id");

        let initialized_resp = post_mcp(
            &client,
            &base_url,
            Some(&session_id),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await?;
        anyhow::ensure!(
            initialized_resp.status().as_u16() == 202,
            "POST /mcp notifications/initialized returned {}",
            initialized_resp.status()
        );

        Ok(Self {
            client,
            base_url,
            session_id,
            next_id: std::sync::atomic::AtomicU64::new(1),
        })
    }

    pub async fn request(&self, method: &str, params: Value) -> anyhow::Result<Value> {
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let resp = post_mcp(
            &self.client,
            &self.base_url,
            Some(&self.session_id),
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }),
        )
        .await?;

        let msg = tokio::time::timeout(Duration::from_secs(15), read_json_message(resp))
            .await
            .context("timeout waiting for response")??;
        anyhow::ensure!(msg.get("id") == Some(&json!(id)), "unexpected id in {msg}");
        Ok(msg)
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> anyhow::Result<ToolOutcome> {
        let msg = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        ToolOutcome::from_message(&msg)
    }
}

/// A decoded `tools/call` result: the error flag plus the JSON carried in the first text block.
#[derive(Debug)]
pub struct ToolOutcome {
    pub is_error: bool,
    pub body: Value,
}

impl ToolOutcome {
    fn from_message(msg: &Value) -> anyhow::Result<Self> {
        let result = msg
            .get("result")
            .with_context(|| format!("tools/call missing result: {msg}"))?;
        let is_error = result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let text = result
            .get("content")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .context("tools/call missing result.content[0].text")?;
        let body = serde_json::from_str(text).context("tools/call text is not JSON")?;
        Ok(Self { is_error, body })
    }

    pub fn ok(self) -> anyhow::Result<Value> {
        anyhow::ensure!(!self.is_error, "tool failed: {}", self.body);
        Ok(self.body)
    }
}

async fn post_mcp(
    client: &reqwest::Client,
    base_url: &str,
    session_id: Option<&str>,
    body: Value,
) -> anyhow::Result<reqwest::Response> {
    let mut req = client
        .post(format!("{base_url}/mcp"))
        .header("Accept", "application/json, text/event-stream")
        .header("Content-Type", "application/json")
        .json(&body);

    if let Some(session_id) = session_id {
        req = req.header("Mcp-Session-Id", session_id);
    }

    req.send()
        .await
        .context("POST /mcp")?
        .error_for_status()
        .context("POST /mcp status")
}

async fn read_json_message(resp: reqwest::Response) -> anyhow::Result<Value> {
    let is_json = resp
        .headers()
        .get("content-type")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if is_json {
        return resp.json().await.context("parse JSON response");
    }

    let mut stream = resp.bytes_stream();
    let byte_stream = futures::stream::poll_fn(move |cx| stream.poll_next_unpin(cx))
        .map(|r| r.map_err(std::io::Error::other));
    let reader = StreamReader::new(byte_stream);
    let mut lines = tokio::io::BufReader::new(reader).lines();

    let mut data_lines: Vec<String> = Vec::new();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim_end();

        if line.is_empty() {
            let data = data_lines.join("\n");
            data_lines.clear();
            // Priming events carry an id but no payload.
            if data.trim().is_empty() {
                continue;
            }
            return serde_json::from_str(&data).context("parse event-stream data as JSON");
        }

        if let Some(v) = line.strip_prefix("data:") {
            data_lines.push(v.trim().to_string());
        }
    }

    anyhow::bail!("event-stream ended without a JSON message")
}
