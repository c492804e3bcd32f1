//! Encoding of tool outcomes.
//!
//! Success is a JSON text block (`[]` for no results, `null` for an absent entity). Failure is
//! an error result whose body is `{"error": {"kind", "message", "status"?}}`, so a failed call can
//! never be mistaken for an empty one.

use coverity_connect_client::CoverityError;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::{Value, json};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) fn success<T: Serialize>(value: &T) -> Result<CallToolResult, ErrorData> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ErrorData::internal_error(format!("serialize tool result: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

pub(crate) fn failure_body(err: &CoverityError) -> Value {
    let mut body = json!({
        "kind": err.kind(),
        "message": err.to_string(),
    });
    if let (Some(status), Some(obj)) = (err.status(), body.as_object_mut()) {
        obj.insert("status".to_string(), json!(status));
    }
    json!({ "error": body })
}

pub(crate) fn failure(err: &CoverityError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(failure_body(err).to_string())])
}

pub(crate) fn cancelled() -> CallToolResult {
    let body = json!({
        "error": { "kind": "cancelled", "message": "request cancelled" }
    });
    CallToolResult::error(vec![Content::text(body.to_string())])
}

/// Run one tool's remote work, racing it against the request's cancellation token.
///
/// Cancelling drops the in-flight future, which aborts any outstanding HTTP request.
pub(crate) async fn run_tool<T, F>(
    tool: &'static str,
    ct: &CancellationToken,
    work: F,
) -> Result<CallToolResult, ErrorData>
where
    T: Serialize,
    F: Future<Output = coverity_connect_client::Result<T>>,
{
    tokio::select! {
        () = ct.cancelled() => {
            debug!(tool, "tool call cancelled");
            Ok(cancelled())
        }
        res = work => match res {
            Ok(value) => success(&value),
            Err(e) => {
                warn!(tool, kind = e.kind(), error = %e, "tool call failed");
                Ok(failure(&e))
            }
        }
    }
}
