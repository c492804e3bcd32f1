//! Connection settings for a Coverity Connect server.
//!
//! Settings are read once at startup from named inputs (normally the process environment). The
//! raw inputs are collected into [`Settings`], optionally overridden by the CLI, and validated
//! into an immutable [`ConnectionConfig`].

use crate::error::ConfigError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const ENV_HOST: &str = "COVERITY_HOST";
pub const ENV_PORT: &str = "COVERITY_PORT";
pub const ENV_SSL: &str = "COVERITY_SSL";
pub const ENV_USERNAME: &str = "COVAUTHUSER";
pub const ENV_SECRET: &str = "COVAUTHKEY";
pub const ENV_PROXY_HOST: &str = "PROXY_HOST";
pub const ENV_PROXY_PORT: &str = "PROXY_PORT";
pub const ENV_PROXY_USER: &str = "PROXY_USER";
pub const ENV_PROXY_PASS: &str = "PROXY_PASS";
pub const ENV_CA_CERT: &str = "COVERITY_CA_CERT";
pub const ENV_TIMEOUT_SECS: &str = "COVERITY_TIMEOUT_SECS";

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const REDACTED: &str = "<redacted>";

/// Raw, unvalidated connection inputs.
///
/// Blank values are treated as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub host: Option<String>,
    pub port: Option<String>,
    pub ssl: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
    pub proxy_host: Option<String>,
    pub proxy_port: Option<String>,
    pub proxy_user: Option<String>,
    pub proxy_pass: Option<String>,
    pub ca_cert: Option<String>,
    pub timeout_secs: Option<String>,
}

impl Settings {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary lookup (used by tests and embedders).
    #[must_use]
    pub fn from_lookup(mut lookup: impl FnMut(&str) -> Option<String>) -> Self {
        let mut get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            host: get(ENV_HOST),
            port: get(ENV_PORT),
            ssl: get(ENV_SSL),
            username: get(ENV_USERNAME),
            secret: get(ENV_SECRET),
            proxy_host: get(ENV_PROXY_HOST),
            proxy_port: get(ENV_PROXY_PORT),
            proxy_user: get(ENV_PROXY_USER),
            proxy_pass: get(ENV_PROXY_PASS),
            ca_cert: get(ENV_CA_CERT),
            timeout_secs: get(ENV_TIMEOUT_SECS),
        }
    }

    /// Validate and freeze the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming every absent mandatory input (host, username,
    /// secret), or [`ConfigError::Invalid`] when a present value cannot be interpreted.
    pub fn into_config(self) -> Result<ConnectionConfig, ConfigError> {
        let (Some(raw_host), Some(username), Some(secret)) =
            (self.host.as_deref(), &self.username, &self.secret)
        else {
            let missing = [
                (ENV_HOST, self.host.is_none()),
                (ENV_USERNAME, self.username.is_none()),
                (ENV_SECRET, self.secret.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(ConfigError::Missing(missing));
        };

        let target = parse_host(raw_host)?;

        let use_tls = match self.ssl.as_deref() {
            Some(v) => parse_bool(ENV_SSL, v)?,
            None => target.scheme_tls.unwrap_or(true),
        };

        let port = match self.port.as_deref() {
            Some(v) => parse_port(ENV_PORT, v)?,
            None => match (target.port, target.scheme_tls) {
                (Some(p), _) => p,
                (None, Some(false)) => DEFAULT_HTTP_PORT,
                (None, _) => DEFAULT_PORT,
            },
        };

        let proxy = match (self.proxy_host, self.proxy_port.as_deref()) {
            (Some(host), Some(port)) => Some(ProxyConfig {
                host,
                port: parse_port(ENV_PROXY_PORT, port)?,
                credentials: self.proxy_user.zip(self.proxy_pass),
            }),
            _ => None,
        };

        let timeout = match self.timeout_secs.as_deref() {
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: ENV_TIMEOUT_SECS,
                        reason: format!("expected a positive number of seconds, got '{v}'"),
                    });
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        let config = ConnectionConfig {
            host: target.host,
            port,
            use_tls,
            username: username.clone(),
            secret: secret.clone(),
            proxy,
            ca_cert: self.ca_cert.map(PathBuf::from),
            timeout,
        };
        // Reject hosts that cannot form a URL now rather than on the first request.
        config.base_url()?;
        Ok(config)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl", &self.ssl)
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| REDACTED))
            .field("proxy_host", &self.proxy_host)
            .field("proxy_port", &self.proxy_port)
            .field("proxy_user", &self.proxy_user)
            .field("proxy_pass", &self.proxy_pass.as_ref().map(|_| REDACTED))
            .field("ca_cert", &self.ca_cert)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Validated connection parameters. Built once at startup and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: String,
    pub secret: String,
    pub proxy: Option<ProxyConfig>,
    /// Extra PEM root certificate trusted in addition to the built-in roots.
    pub ca_cert: Option<PathBuf>,
    pub timeout: Duration,
}

impl ConnectionConfig {
    /// Minimal config with defaults for everything optional.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        use_tls: bool,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            use_tls,
            username: username.into(),
            secret: secret.into(),
            proxy: None,
            ca_cert: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// `https://host:port` or `http://host:port`, matching `use_tls`.
    #[must_use]
    pub fn server_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Parsed form of [`Self::server_url`].
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be part of a URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.server_url()).map_err(|e| ConfigError::Invalid {
            name: ENV_HOST,
            reason: format!("'{}' does not form a valid URL: {e}", self.host),
        })
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server_url", &self.server_url())
            .field("username", &self.username)
            .field("secret", &REDACTED)
            .field("proxy", &self.proxy)
            .field("ca_cert", &self.ca_cert)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Outbound proxy. Credentials are attached only when both user and password are given.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Option<(String, String)>,
}

impl ProxyConfig {
    /// Proxy URL without credentials (`http://host:port`).
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("url", &self.url())
            .field(
                "credentials",
                &self.credentials.as_ref().map(|(user, _)| (user, REDACTED)),
            )
            .finish()
    }
}

struct HostTarget {
    host: String,
    port: Option<u16>,
    scheme_tls: Option<bool>,
}

/// Accepts either a bare host name or a URL (`https://cov.example.com:8443`).
fn parse_host(raw: &str) -> Result<HostTarget, ConfigError> {
    if !raw.contains("://") {
        return Ok(HostTarget {
            host: raw.trim_end_matches('/').to_string(),
            port: None,
            scheme_tls: None,
        });
    }

    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name: ENV_HOST,
        reason: format!("'{raw}' is not a valid URL: {e}"),
    })?;
    let scheme_tls = match url.scheme() {
        "https" => true,
        "http" => false,
        other => {
            return Err(ConfigError::Invalid {
                name: ENV_HOST,
                reason: format!("unsupported scheme '{other}' (expected http or https)"),
            });
        }
    };
    let host = url.host_str().ok_or_else(|| ConfigError::Invalid {
        name: ENV_HOST,
        reason: format!("'{raw}' has no host"),
    })?;

    Ok(HostTarget {
        host: host.to_string(),
        port: url.port(),
        scheme_tls: Some(scheme_tls),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            reason: format!("expected true or false, got '{value}'"),
        }),
    }
}

fn parse_port(name: &'static str, value: &str) -> Result<u16, ConfigError> {
    match value.parse::<u16>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a TCP port, got '{value}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_HOST, "cov.example.com"),
            (ENV_USERNAME, "alice"),
            (ENV_SECRET, "key"),
        ]
    }

    #[test]
    fn defaults_to_tls_on_443() {
        let cfg = settings(&minimal()).into_config().expect("valid");
        assert_eq!(cfg.port, 443);
        assert!(cfg.use_tls);
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
        assert_eq!(cfg.server_url(), "https://cov.example.com:443");
    }

    #[test]
    fn server_url_scheme_follows_tls_flag() {
        let mut pairs = minimal();
        pairs.push((ENV_SSL, "False"));
        pairs.push((ENV_PORT, "5000"));
        let cfg = settings(&pairs).into_config().expect("valid");
        assert_eq!(cfg.server_url(), "http://cov.example.com:5000");
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let err = settings(&[(ENV_PORT, "8443")]).into_config().unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing(vec![ENV_HOST, ENV_USERNAME, ENV_SECRET])
        );
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = settings(&[(ENV_HOST, "  "), (ENV_USERNAME, "u"), (ENV_SECRET, "k")])
            .into_config()
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing(vec![ENV_HOST]));
    }

    #[test]
    fn invalid_port_and_flag_are_rejected() {
        let mut pairs = minimal();
        pairs.push((ENV_PORT, "not-a-port"));
        assert!(matches!(
            settings(&pairs).into_config(),
            Err(ConfigError::Invalid { name: ENV_PORT, .. })
        ));

        let mut pairs = minimal();
        pairs.push((ENV_SSL, "maybe"));
        assert!(matches!(
            settings(&pairs).into_config(),
            Err(ConfigError::Invalid { name: ENV_SSL, .. })
        ));
    }

    #[test]
    fn url_form_host_supplies_scheme_and_port() {
        let cfg = settings(&[
            (ENV_HOST, "http://cov.internal:9090/"),
            (ENV_USERNAME, "u"),
            (ENV_SECRET, "k"),
        ])
        .into_config()
        .expect("valid");
        assert_eq!(cfg.host, "cov.internal");
        assert_eq!(cfg.port, 9090);
        assert!(!cfg.use_tls);

        let cfg = settings(&[
            (ENV_HOST, "http://cov.internal"),
            (ENV_PORT, "7000"),
            (ENV_SSL, "true"),
            (ENV_USERNAME, "u"),
            (ENV_SECRET, "k"),
        ])
        .into_config()
        .expect("valid");
        assert_eq!(cfg.server_url(), "https://cov.internal:7000");
    }

    #[test]
    fn proxy_requires_host_and_port() {
        let mut pairs = minimal();
        pairs.push((ENV_PROXY_HOST, "proxy.local"));
        let cfg = settings(&pairs).into_config().expect("valid");
        assert!(cfg.proxy.is_none());

        pairs.push((ENV_PROXY_PORT, "3128"));
        pairs.push((ENV_PROXY_USER, "puser"));
        let cfg = settings(&pairs).into_config().expect("valid");
        let proxy = cfg.proxy.expect("proxy");
        assert_eq!(proxy.url(), "http://proxy.local:3128");
        assert!(proxy.credentials.is_none());

        pairs.push((ENV_PROXY_PASS, "ppass"));
        let cfg = settings(&pairs).into_config().expect("valid");
        assert_eq!(
            cfg.proxy.and_then(|p| p.credentials),
            Some(("puser".to_string(), "ppass".to_string()))
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let mut pairs = minimal();
        pairs.push((ENV_PROXY_HOST, "proxy.local"));
        pairs.push((ENV_PROXY_PORT, "3128"));
        pairs.push((ENV_PROXY_USER, "puser"));
        pairs.push((ENV_PROXY_PASS, "hunter2"));
        let s = settings(&pairs);
        assert!(!format!("{s:?}").contains("hunter2"));
        let cfg = s.into_config().expect("valid");
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("\"key\""));
    }
}
