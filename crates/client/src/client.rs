//! HTTP client for the Coverity Connect `/api/v2` REST surface.

use crate::config::{ConnectionConfig, ENV_CA_CERT, ENV_PROXY_HOST};
use crate::error::{ConfigError, CoverityError, Result};
use crate::model::{
    DefectDetail, Defect, DefectQuery, Project, Stream, User, UserQuery, UserSummary,
};
use crate::response::{list_under, single, single_identified};
use crate::safety::{redact_url, truncate_body};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

/// Row count used when a lookup has to fall back to scanning the user list.
const USER_SCAN_LIMIT: u32 = 1000;

/// Read-only operations against a Coverity Connect server.
///
/// Every call is a fresh remote round trip; nothing is cached. "Not found" is `None` (or an
/// empty list), never an error.
#[async_trait]
pub trait CoverityApi: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// Linear scan of [`Self::list_projects`]. A key match wins over a name match.
    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let projects = self.list_projects().await?;
        let by_key = projects
            .iter()
            .position(|p| p.key.as_deref() == Some(id));
        let idx = by_key.or_else(|| projects.iter().position(|p| p.matches(id)));
        Ok(idx.and_then(|i| projects.into_iter().nth(i)))
    }

    async fn list_streams(&self, project_id: Option<&str>) -> Result<Vec<Stream>>;

    async fn search_defects(&self, query: &DefectQuery) -> Result<Vec<Defect>>;

    async fn get_defect(&self, cid: &str) -> Result<Option<DefectDetail>>;

    async fn list_users(&self, query: &UserQuery) -> Result<Vec<User>>;

    async fn get_user(&self, username: &str) -> Result<Option<User>>;

    async fn user_summary(&self) -> Result<Option<UserSummary>>;
}

/// Pooled client bound to one server and one set of credentials.
///
/// Construct once at startup and share through `Arc`; the connection pool is released when the
/// last handle is dropped.
pub struct CoverityClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    secret: String,
}

impl CoverityClient {
    /// Build the client. TLS verification is always on; an extra root certificate may be
    /// trusted through `ca_cert`. Without a configured proxy, ambient proxy variables are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL, proxy or CA bundle is invalid, or if the underlying
    /// HTTP client cannot be built.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let base_url = config.base_url()?;

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("coverity-mcp-server/", env!("CARGO_PKG_VERSION")));

        builder = match &config.proxy {
            Some(proxy) => {
                let mut p = reqwest::Proxy::all(proxy.url()).map_err(|e| ConfigError::Invalid {
                    name: ENV_PROXY_HOST,
                    reason: e.to_string(),
                })?;
                if let Some((user, pass)) = &proxy.credentials {
                    p = p.basic_auth(user, pass);
                }
                builder.proxy(p)
            }
            None => builder.no_proxy(),
        };

        if let Some(path) = &config.ca_cert {
            let pem = std::fs::read(path).map_err(|e| ConfigError::Invalid {
                name: ENV_CA_CERT,
                reason: format!("cannot read {}: {e}", path.display()),
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| ConfigError::Invalid {
                name: ENV_CA_CERT,
                reason: format!("{} is not a PEM certificate: {e}", path.display()),
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder.build()?;

        Ok(Self {
            http,
            base_url,
            username: config.username.clone(),
            secret: config.secret.clone(),
        })
    }

    /// Base URL the client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ConfigError::Invalid {
                name: crate::config::ENV_HOST,
                reason: format!("'{}' cannot be used as a base URL", self.base_url),
            })?
            .clear()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// GET a JSON document. `Ok(None)` means the remote answered 404. `endpoint` is the
    /// encoded request path, used to label errors.
    async fn get_json(&self, url: Url, endpoint: &str) -> Result<Option<Value>> {
        let started = Instant::now();

        let resp = self
            .http
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .inspect_err(|e| warn!(url = %redact_url(&url), error = %e, "request failed"))?;

        let status = resp.status();
        debug!(
            endpoint = %endpoint,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis(),
            "coverity request"
        );

        match status {
            s if s.is_success() => {
                let bytes = resp.bytes().await?;
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Some(Value::Null));
                }
                serde_json::from_slice(&bytes)
                    .map(Some)
                    .map_err(|e| CoverityError::Malformed {
                        endpoint: endpoint.to_string(),
                        reason: format!("body is not JSON: {e}"),
                    })
            }
            StatusCode::UNAUTHORIZED => Err(CoverityError::AuthenticationFailed),
            StatusCode::NOT_FOUND => Ok(None),
            s => {
                let text = resp.text().await.unwrap_or_default();
                let message = if text.trim().is_empty() {
                    s.canonical_reason().unwrap_or("no response body").to_string()
                } else {
                    truncate_body(&text)
                };
                Err(CoverityError::Remote {
                    status: s.as_u16(),
                    message,
                })
            }
        }
    }

    async fn get_list<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        key: &str,
    ) -> Result<Vec<T>> {
        let url = self.endpoint(segments, query)?;
        let endpoint = url.path().to_string();
        match self.get_json(url, &endpoint).await? {
            Some(body) => list_under(&endpoint, body, key),
            None => Ok(Vec::new()),
        }
    }

    async fn get_single<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        key: &str,
    ) -> Result<Option<T>> {
        let url = self.endpoint(segments, &[])?;
        let endpoint = url.path().to_string();
        match self.get_json(url, &endpoint).await? {
            Some(body) => single(&endpoint, body, key),
            None => Ok(None),
        }
    }

    /// Detail lookup that only accepts a record whose `id_field` equals `id`.
    async fn get_identified<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        key: &str,
        id_field: &str,
        id: &str,
    ) -> Result<Option<T>> {
        let url = self.endpoint(segments, &[])?;
        let endpoint = url.path().to_string();
        match self.get_json(url, &endpoint).await? {
            Some(body) => single_identified(&endpoint, body, key, id_field, id),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CoverityApi for CoverityClient {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.get_list(&["api", "v2", "projects"], &[], "projects")
            .await
    }

    async fn list_streams(&self, project_id: Option<&str>) -> Result<Vec<Stream>> {
        let query: Vec<(&str, String)> = project_id
            .map(|p| vec![("projectId", p.to_string())])
            .unwrap_or_default();
        self.get_list(&["api", "v2", "streams"], &query, "streams")
            .await
    }

    async fn search_defects(&self, query: &DefectQuery) -> Result<Vec<Defect>> {
        let mut params: Vec<(&str, String)> = vec![("rowCount", query.limit.to_string())];
        if let Some(stream) = &query.stream_id {
            params.push(("streamId", stream.clone()));
        }
        if let Some(q) = &query.query {
            params.push(("query", q.clone()));
        }
        params.extend(query.filters.iter().map(|(k, v)| (k.as_str(), v.clone())));
        self.get_list(&["api", "v2", "issues", "search"], &params, "issues")
            .await
    }

    async fn get_defect(&self, cid: &str) -> Result<Option<DefectDetail>> {
        self.get_identified(&["api", "v2", "issues", cid], "issues", "cid", cid)
            .await
    }

    async fn list_users(&self, query: &UserQuery) -> Result<Vec<User>> {
        let params = [
            ("disabled", query.include_disabled.to_string()),
            ("includeDetails", "true".to_string()),
            ("locked", query.include_locked.to_string()),
            ("offset", "0".to_string()),
            ("rowCount", query.limit.to_string()),
            ("sortColumn", "name".to_string()),
            ("sortOrder", "asc".to_string()),
        ];
        self.get_list(&["api", "v2", "users"], &params, "users")
            .await
    }

    /// Direct lookup first; if the remote reports the user absent, scan the full list
    /// (disabled and locked users included) before giving up.
    async fn get_user(&self, username: &str) -> Result<Option<User>> {
        if let Some(user) = self
            .get_identified::<User>(&["api", "v2", "users", username], "users", "name", username)
            .await?
        {
            return Ok(Some(user));
        }

        let everyone = UserQuery {
            include_disabled: true,
            include_locked: true,
            limit: USER_SCAN_LIMIT,
        };
        Ok(self
            .list_users(&everyone)
            .await?
            .into_iter()
            .find(|u| u.username == username))
    }

    async fn user_summary(&self) -> Result<Option<UserSummary>> {
        self.get_single(&["api", "v2", "users", "summary"], "summary")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;

    fn client() -> CoverityClient {
        let cfg = ConnectionConfig::new("cov.example.com", 8443, true, "alice", "key");
        CoverityClient::new(&cfg).expect("client")
    }

    #[test]
    fn endpoint_percent_encodes_segments() {
        let url = client()
            .endpoint(&["api", "v2", "users", "a b/c"], &[])
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://cov.example.com:8443/api/v2/users/a%20b%2Fc"
        );
    }

    #[test]
    fn endpoint_appends_query_in_order() {
        let url = client()
            .endpoint(
                &["api", "v2", "issues", "search"],
                &[("rowCount", "5".to_string()), ("checker", "NULL_RETURNS".to_string())],
            )
            .expect("url");
        assert_eq!(url.query(), Some("rowCount=5&checker=NULL_RETURNS"));
    }

    #[test]
    fn proxy_with_credentials_builds() {
        let cfg = ConnectionConfig::new("cov.example.com", 443, true, "alice", "key").with_proxy(
            ProxyConfig {
                host: "proxy.local".to_string(),
                port: 3128,
                credentials: Some(("puser".to_string(), "ppass".to_string())),
            },
        );
        assert!(CoverityClient::new(&cfg).is_ok());
    }

    #[test]
    fn unreadable_ca_bundle_is_a_config_error() {
        let mut cfg = ConnectionConfig::new("cov.example.com", 443, true, "alice", "key");
        cfg.ca_cert = Some("/nonexistent/ca.pem".into());
        let Err(err) = CoverityClient::new(&cfg) else {
            panic!("expected error");
        };
        assert_eq!(err.kind(), "configuration_error");
    }
}
