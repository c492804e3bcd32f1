//! Command-line interface. Connection flags override the environment at startup only.

use clap::{Parser, Subcommand, ValueEnum};
use coverity_connect_client::Settings;
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(
    name = "coverity-mcp-server",
    version,
    about = "Expose a Coverity Connect server to MCP clients"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Coverity Connect host name or URL (overrides COVERITY_HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Coverity Connect port (overrides COVERITY_PORT)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Use HTTPS (overrides COVERITY_SSL)
    #[arg(long, global = true, overrides_with = "no_ssl")]
    pub ssl: bool,

    /// Use plain HTTP (overrides COVERITY_SSL)
    #[arg(long = "no-ssl", global = true, overrides_with = "ssl")]
    pub no_ssl: bool,

    /// Account name (overrides COVAUTHUSER)
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Password or authentication key (overrides COVAUTHKEY)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Request timeout in seconds (overrides COVERITY_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// MCP transport
    #[arg(long, env = "COVERITY_MCP_TRANSPORT", value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Listen address for the HTTP transport
    #[arg(long, env = "COVERITY_MCP_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Log level filter (e.g. info, debug); RUST_LOG takes precedence when set
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (logs always go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Validate configuration, call the server once and report the project count
    Check,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    #[must_use]
    pub fn ssl_override(&self) -> Option<bool> {
        match (self.ssl, self.no_ssl) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Layer the connection flags over settings read from the environment.
    #[must_use]
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(host) = &self.host {
            settings.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            settings.port = Some(port.to_string());
        }
        if let Some(ssl) = self.ssl_override() {
            settings.ssl = Some(ssl.to_string());
        }
        if let Some(username) = &self.username {
            settings.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            settings.secret = Some(password.clone());
        }
        if let Some(secs) = self.timeout_secs {
            settings.timeout_secs = Some(secs.to_string());
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_settings() -> Settings {
        Settings::from_lookup(|k| match k {
            "COVERITY_HOST" => Some("env-host".to_string()),
            "COVERITY_PORT" => Some("8443".to_string()),
            "COVERITY_SSL" => Some("true".to_string()),
            "COVAUTHUSER" => Some("env-user".to_string()),
            "COVAUTHKEY" => Some("env-key".to_string()),
            _ => None,
        })
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::parse_from([
            "coverity-mcp-server",
            "--host",
            "cli-host",
            "--port",
            "5000",
            "--no-ssl",
            "--username",
            "cli-user",
        ]);
        let cfg = cli.apply(env_settings()).into_config().expect("valid");
        assert_eq!(cfg.server_url(), "http://cli-host:5000");
        assert_eq!(cfg.username, "cli-user");
        assert_eq!(cfg.secret, "env-key");
    }

    #[test]
    fn absent_flags_keep_environment() {
        let cli = Cli::parse_from(["coverity-mcp-server"]);
        assert_eq!(cli.ssl_override(), None);
        assert_eq!(cli.transport, Transport::Stdio);
        let cfg = cli.apply(env_settings()).into_config().expect("valid");
        assert_eq!(cfg.server_url(), "https://env-host:8443");
    }

    #[test]
    fn last_ssl_flag_wins() {
        let cli = Cli::parse_from(["coverity-mcp-server", "--no-ssl", "--ssl"]);
        assert_eq!(cli.ssl_override(), Some(true));
    }

    #[test]
    fn check_subcommand_accepts_connection_flags() {
        let cli = Cli::parse_from(["coverity-mcp-server", "check", "--host", "h"]);
        assert_eq!(cli.command, Some(Command::Check));
        assert_eq!(cli.host.as_deref(), Some("h"));
    }
}
