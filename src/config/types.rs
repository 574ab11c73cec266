//! Configuration types.

use crate::csrf::DEFAULT_TOKEN_TTL_SECONDS;
use anyhow::{Context, anyhow};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default port for the HTTP server.
pub const DEFAULT_PORT: u16 = 8080;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub app: AppSettings,

    #[serde(default)]
    pub date: DateConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

impl Config {
    /// Load a single configuration file, filling gaps with defaults.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Whether internal error details may be shown to clients.
    pub fn expose_errors(&self) -> bool {
        self.app.debug && self.app.env != Environment::Production
    }
}

/// HTTP server and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind (default: 8080).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
        }
    }
}

impl ServerConfig {
    /// Socket address to bind. Host names such as `localhost` are resolved.
    pub async fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("failed to resolve {}:{}", self.host, self.port))?
            .next()
            .ok_or_else(|| anyhow!("no address found for {}:{}", self.host, self.port))
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_path() -> PathBuf {
    PathBuf::from("todo-board/tasks.db")
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub env: Environment,

    /// Show error details on the error page (never in production).
    #[serde(default)]
    pub debug: bool,
}

/// Date display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateConfig {
    /// `chrono` strftime pattern used for task creation dates.
    #[serde(default = "default_date_format")]
    pub format: String,

    /// IANA zone the dates are shown in (default: UTC).
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl DateConfig {
    /// The configured zone, or UTC if the name is unknown.
    pub fn tz(&self) -> Tz {
        parse_timezone(&self.timezone).unwrap_or(Tz::UTC)
    }
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            format: default_date_format(),
            timezone: default_timezone(),
        }
    }
}

fn default_date_format() -> String {
    "%b %d, %Y - %H:%M".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Look up an IANA zone name such as `Europe/Berlin`.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse().ok()
}

/// Session cookie and anti-forgery token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    /// Token lifetime in seconds (default: 3600).
    #[serde(default = "default_token_ttl")]
    pub csrf_token_ttl_seconds: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            session_cookie: default_session_cookie(),
            csrf_token_ttl_seconds: default_token_ttl(),
        }
    }
}

fn default_session_cookie() -> String {
    "todo_session".to_string()
}

fn default_token_ttl() -> i64 {
    DEFAULT_TOKEN_TTL_SECONDS
}

/// Parse the usual spellings of a boolean flag.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
