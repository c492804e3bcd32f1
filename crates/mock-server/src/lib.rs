//! Mock Coverity Connect server.
//!
//! Serves a fixed slice of the REST API (`/api/v2`) plus canned SOAP envelopes for the legacy
//! `/ws/v9` services. Stateless apart from an in-memory request log that tests use to assert
//! the remote call pattern.

pub mod fixtures;
mod soap;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::Engine as _;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// One request as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
}

#[derive(Default)]
struct MockState {
    credentials: Option<(String, String)>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Handle to a mock server instance. Cheap to clone; clones share the request log.
#[derive(Clone, Default)]
pub struct MockServer {
    state: Arc<MockState>,
}

impl MockServer {
    /// Mock that accepts any (or no) credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that answers 401 on `/api/*` unless HTTP basic auth matches.
    #[must_use]
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            state: Arc::new(MockState {
                credentials: Some((username.into(), password.into())),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/v2/projects", get(list_projects))
            .route("/api/v2/streams", get(list_streams))
            .route("/api/v2/issues/search", get(search_issues))
            .route("/api/v2/issues/{cid}", get(get_issue))
            .route("/api/v2/users", get(list_users))
            .route("/api/v2/users/summary", get(users_summary))
            .route("/api/v2/users/{username}", get(get_user))
            .route("/ws/v9/configurationservice", post(configuration_service))
            .route("/ws/v9/defectservice", post(defect_service))
            .route("/status", get(status))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                record_and_authorize,
            ))
            .with_state(self.state.clone())
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Requests whose path equals `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.requests.lock().clear();
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying server fails.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}

async fn record_and_authorize(
    State(state): State<Arc<MockState>>,
    req: Request,
    next: Next,
) -> Response {
    let recorded = RecordedRequest {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        query: req.uri().query().map(str::to_string),
    };
    tracing::debug!(method = %recorded.method, path = %recorded.path, "mock request");
    state.requests.lock().push(recorded);

    if let Some((user, pass)) = &state.credentials
        && req.uri().path().starts_with("/api/")
        && !basic_auth_matches(req.headers(), user, pass)
    {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "statusMessage": "Unauthorized",
                "httpStatusCode": 401,
                "detailMessage": "Invalid credentials"
            })),
        )
            .into_response();
    }

    next.run(req).await
}

fn basic_auth_matches(headers: &HeaderMap, user: &str, pass: &str) -> bool {
    let Some(encoded) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
    else {
        return false;
    };
    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded.trim()) else {
        return false;
    };
    decoded == format!("{user}:{pass}").as_bytes()
}

type Params = Query<HashMap<String, String>>;

fn param_bool(params: &HashMap<String, String>, key: &str) -> bool {
    params
        .get(key)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn param_usize(params: &HashMap<String, String>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Value::as_str)
}

async fn list_projects() -> Json<Value> {
    Json(json!({ "projects": fixtures::projects() }))
}

/// Served through the view wrapper so clients exercise the alternate response shape.
async fn list_streams(Query(params): Params) -> Json<Value> {
    let project_key = params.get("projectId").map(|id| {
        fixtures::projects()
            .iter()
            .find(|p| str_field(p, "name") == Some(id.as_str()))
            .and_then(|p| str_field(p, "projectKey").map(str::to_string))
            .unwrap_or_else(|| id.clone())
    });

    let streams: Vec<Value> = fixtures::streams()
        .into_iter()
        .filter(|s| match &project_key {
            Some(key) => str_field(s, "projectId") == Some(key.as_str()),
            None => true,
        })
        .collect();

    Json(json!({ "viewContentsV1": { "streams": streams } }))
}

async fn search_issues(Query(params): Params) -> Json<Value> {
    let eq = |v: &Value, field: &str, param: &str| match params.get(param) {
        Some(want) => str_field(v, field).is_some_and(|have| have.eq_ignore_ascii_case(want)),
        None => true,
    };
    let text = params.get("query").map(|q| q.to_ascii_lowercase());

    let matched: Vec<Value> = fixtures::defects()
        .into_iter()
        .filter(|d| {
            eq(d, "streamId", "streamId")
                && eq(d, "checkerName", "checker")
                && eq(d, "displayImpact", "severity")
                && eq(d, "displayStatus", "status")
        })
        .filter(|d| match &text {
            Some(q) => ["checkerName", "displayType", "displayFile", "displayFunction"]
                .iter()
                .filter_map(|f| str_field(d, f))
                .any(|s| s.to_ascii_lowercase().contains(q)),
            None => true,
        })
        .collect();

    let total = matched.len();
    let row_count = param_usize(&params, "rowCount", 1000);
    let issues: Vec<Value> = matched.into_iter().take(row_count).collect();

    Json(json!({ "issues": issues, "totalRows": total }))
}

async fn get_issue(Path(cid): Path<String>) -> Response {
    match fixtures::defect_detail(&cid) {
        Some(detail) => Json(json!({ "issues": [detail] })).into_response(),
        None => not_found(&format!("CID {cid} was not found.")),
    }
}

async fn list_users(Query(params): Params) -> Json<Value> {
    let include_disabled = param_bool(&params, "disabled");
    let include_locked = param_bool(&params, "locked");
    let row_count = param_usize(&params, "rowCount", 200);
    let offset = param_usize(&params, "offset", 0);
    let sort_column = params
        .get("sortColumn")
        .map_or("name", String::as_str)
        .to_string();
    let descending = params
        .get("sortOrder")
        .is_some_and(|o| o.eq_ignore_ascii_case("desc"));

    let mut users: Vec<Value> = fixtures::users()
        .into_iter()
        .filter(|u| include_disabled || !u["disabled"].as_bool().unwrap_or(false))
        .filter(|u| include_locked || !u["locked"].as_bool().unwrap_or(false))
        .collect();

    if matches!(sort_column.as_str(), "name" | "email" | "dateCreated") {
        users.sort_by(|a, b| {
            let a = str_field(a, &sort_column).unwrap_or_default();
            let b = str_field(b, &sort_column).unwrap_or_default();
            if descending { b.cmp(a) } else { a.cmp(b) }
        });
    }

    let total = users.len();
    let page: Vec<Value> = users.into_iter().skip(offset).take(row_count).collect();

    Json(json!({
        "users": page,
        "totalCount": total,
        "offset": offset,
        "rowCount": page.len()
    }))
}

async fn users_summary() -> Json<Value> {
    let users = fixtures::users();
    let total = users.len();
    let active = users
        .iter()
        .filter(|u| !u["disabled"].as_bool().unwrap_or(false))
        .count();
    let admins = users
        .iter()
        .filter(|u| u["superUser"].as_bool().unwrap_or(false))
        .count();

    let mut roles: BTreeMap<String, u64> = BTreeMap::new();
    for user in &users {
        for ra in user["roleAssignments"].as_array().into_iter().flatten() {
            let role = str_field(ra, "roleName").unwrap_or("unknown").to_string();
            *roles.entry(role).or_default() += 1;
        }
    }

    Json(json!({
        "summary": {
            "totalUsers": total,
            "activeUsers": active,
            "disabledUsers": total - active,
            "adminUsers": admins,
            "roleDistribution": roles
        },
        "lastUpdated": "2024-07-21T10:00:00Z"
    }))
}

async fn get_user(Path(username): Path<String>) -> Response {
    match fixtures::users()
        .into_iter()
        .find(|u| str_field(u, "name") == Some(username.as_str()))
    {
        Some(user) => Json(json!({ "users": [user] })).into_response(),
        None => not_found(&format!("No user matches {username}.")),
    }
}

async fn configuration_service(headers: HeaderMap, body: String) -> Response {
    soap::configuration_service(&headers, &body)
}

async fn defect_service() -> Response {
    soap::defect_service()
}

async fn status() -> Json<Value> {
    Json(json!({
        "status": "running",
        "message": "Mock Coverity Connect server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "endpoints": [
            "/api/v2/projects",
            "/api/v2/streams",
            "/api/v2/issues/search",
            "/api/v2/users",
            "/ws/v9/configurationservice",
            "/ws/v9/defectservice"
        ],
        "fixtures": {
            "projects": fixtures::projects().len(),
            "streams": fixtures::streams().len(),
            "snapshots": fixtures::snapshots().len(),
            "defects": fixtures::defects().len(),
            "users": fixtures::users().len()
        }
    }))
}

fn not_found(detail: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "statusMessage": "Not Found",
            "httpStatusCode": 404,
            "detailMessage": detail
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn spawn(server: MockServer) -> (String, tokio::sync::oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(server.serve(listener, async move {
            let _ = rx.await;
        }));
        (format!("http://{addr}"), tx)
    }

    #[tokio::test]
    async fn streams_use_view_wrapper_and_filter_by_name_or_key() {
        let (base, _stop) = spawn(MockServer::new()).await;
        let client = reqwest::Client::new();

        for id in ["PROJ002", "MobileApp"] {
            let v: Value = client
                .get(format!("{base}/api/v2/streams?projectId={id}"))
                .send()
                .await
                .expect("send")
                .json()
                .await
                .expect("json");
            let names: Vec<&str> = v["viewContentsV1"]["streams"]
                .as_array()
                .expect("streams")
                .iter()
                .filter_map(|s| s["name"].as_str())
                .collect();
            assert_eq!(names, vec!["MobileApp-main", "MobileApp-feature"]);
        }
    }

    #[tokio::test]
    async fn credentials_are_enforced_on_api_only() {
        let server = MockServer::with_credentials("u", "p");
        let (base, _stop) = spawn(server.clone()).await;
        let client = reqwest::Client::new();

        let denied = client
            .get(format!("{base}/api/v2/projects"))
            .basic_auth("u", Some("wrong"))
            .send()
            .await
            .expect("send");
        assert_eq!(denied.status().as_u16(), 401);

        let ok = client
            .get(format!("{base}/api/v2/projects"))
            .basic_auth("u", Some("p"))
            .send()
            .await
            .expect("send");
        assert!(ok.status().is_success());

        let status = client
            .get(format!("{base}/status"))
            .send()
            .await
            .expect("send");
        assert!(status.status().is_success());

        assert_eq!(server.requests_to("/api/v2/projects").len(), 2);
    }

    #[tokio::test]
    async fn soap_dispatch_on_action_substring() {
        let (base, _stop) = spawn(MockServer::new()).await;
        let client = reqwest::Client::new();

        let projects = client
            .post(format!("{base}/ws/v9/configurationservice"))
            .header("SOAPAction", "\"getProjects\"")
            .body("<soap:Envelope/>")
            .send()
            .await
            .expect("send")
            .text()
            .await
            .expect("text");
        assert!(projects.contains("<ns1:projectKey>PROJ003</ns1:projectKey>"));

        let snapshots = client
            .post(format!("{base}/ws/v9/configurationservice"))
            .body("<ns1:getSnapshotsForStream/>")
            .send()
            .await
            .expect("send")
            .text()
            .await
            .expect("text");
        assert!(snapshots.contains("<ns1:id>12347</ns1:id>"));

        let generic = client
            .post(format!("{base}/ws/v9/configurationservice"))
            .body("<ns1:somethingElse/>")
            .send()
            .await
            .expect("send")
            .text()
            .await
            .expect("text");
        assert!(generic.contains("SUCCESS"));

        let defects = client
            .post(format!("{base}/ws/v9/defectservice"))
            .send()
            .await
            .expect("send")
            .text()
            .await
            .expect("text");
        assert!(defects.contains("<ns1:cid>1003</ns1:cid>"));
    }
}
