//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::merge_all;
use super::types::{Config, Environment, parse_bool, parse_timezone};
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Name of the configuration file looked up in each tier directory.
pub const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Built-in defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/todo-board/)
    Project = 1,
    /// User-level config (~/.todo-board/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration directories from environment and defaults.
    pub fn discover() -> Self {
        // Project dir: TODO_BOARD_PROJECT_DIR or $CWD/todo-board
        let project_dir = std::env::var("TODO_BOARD_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("todo-board")));

        // User dir: TODO_BOARD_USER_DIR or ~/.todo-board
        let user_dir = std::env::var("TODO_BOARD_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".todo-board")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    fn tier_files(&self) -> Vec<(ConfigTier, PathBuf)> {
        let mut files = Vec::new();
        if let Some(ref dir) = self.project_dir {
            files.push((ConfigTier::Project, dir.join(CONFIG_FILE)));
        }
        if let Some(ref dir) = self.user_dir {
            files.push((ConfigTier::User, dir.join(CONFIG_FILE)));
        }
        files
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Config files that contributed, lowest tier first.
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers and the process environment.
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var("TODO_BOARD_CONFIG_PATH") {
            return Self::load_file(explicit, |key| std::env::var(key).ok());
        }
        Self::load_with(ConfigPaths::discover(), |key| std::env::var(key).ok())
    }

    /// Load from one explicit file plus environment overrides.
    pub fn load_file<P, F>(path: P, env: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let mut config = Config::load(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?;
        apply_env_overrides(&mut config, env);
        reset_invalid_timezone(&mut config);
        Ok(Self {
            paths: ConfigPaths::default(),
            config,
            sources: vec![path.to_path_buf()],
        })
    }

    /// Load with explicit tier directories and an environment lookup.
    pub fn load_with<F>(paths: ConfigPaths, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut layers: Vec<Value> = vec![serde_yaml::to_value(Config::default())?];
        let mut sources = Vec::new();

        for (tier, file) in paths.tier_files() {
            if !file.exists() {
                continue;
            }
            match read_yaml(&file) {
                Ok(value) => {
                    layers.push(value);
                    sources.push(file);
                }
                Err(e) => warn!(tier = %tier, file = %file.display(), "Ignoring config file: {:#}", e),
            }
        }

        let mut config: Config = serde_yaml::from_value(merge_all(layers))?;
        apply_env_overrides(&mut config, env);
        reset_invalid_timezone(&mut config);

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Files that contributed to the configuration.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

/// A zone name from a config file that chrono-tz does not know falls back to UTC.
fn reset_invalid_timezone(config: &mut Config) {
    if parse_timezone(&config.date.timezone).is_none() {
        warn!(value = %config.date.timezone, "Unknown time zone in config, using UTC");
        config.date.timezone = "UTC".to_string();
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Apply environment variable overrides to config.
///
/// Unparseable values are logged and ignored.
pub fn apply_env_overrides<F>(config: &mut Config, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(db_path) = env("TODO_BOARD_DB_PATH") {
        config.server.db_path = PathBuf::from(db_path);
    }

    if let Some(host) = env("SERVER_HOST") {
        config.server.host = host;
    }

    if let Some(port) = env("SERVER_PORT") {
        match port.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %port, "Ignoring invalid SERVER_PORT"),
        }
    }

    if let Some(app_env) = env("APP_ENV") {
        match Environment::parse(&app_env) {
            Some(app_env) => config.app.env = app_env,
            None => warn!(value = %app_env, "Ignoring invalid APP_ENV"),
        }
    }

    if let Some(raw) = env("APP_DEBUG") {
        match parse_bool(&raw) {
            Some(enabled) => config.app.debug = enabled,
            None => warn!(value = %raw, "Ignoring invalid APP_DEBUG"),
        }
    }

    if let Some(format) = env("DATE_FORMAT") {
        config.date.format = format;
    }

    // DATE_TIMEZONE is more specific and wins over APP_TIMEZONE.
    for key in ["APP_TIMEZONE", "DATE_TIMEZONE"] {
        if let Some(zone) = env(key) {
            match parse_timezone(&zone) {
                Some(_) => config.date.timezone = zone.trim().to_string(),
                None => warn!(var = key, value = %zone, "Ignoring unknown time zone"),
            }
        }
    }

    if let Some(ttl) = env("CSRF_TOKEN_TTL") {
        match ttl.trim().parse::<i64>() {
            Ok(ttl) if ttl > 0 => config.security.csrf_token_ttl_seconds = ttl,
            _ => warn!(value = %ttl, "Ignoring invalid CSRF_TOKEN_TTL"),
        }
    }
}
