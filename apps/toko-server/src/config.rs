//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TOKO_DB_PATH=/var/lib/toko/toko.db                                 │
//! │     TOKO_PORT=8080                                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $TOKO_CONFIG, or                                                   │
//! │     ~/.config/toko-pos/toko.toml (Linux)                               │
//! │     ~/Library/Application Support/com.toko.pos/toko.toml (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The unpaid-order timeout is not configured here. It lives in the
//! `settings` table so staff can change it while the server runs.
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "toko.db"
//! max_connections = 10
//!
//! [scheduler]
//! enabled = true
//! interval_secs = 60
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use toko_db::DbConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TOKO_CONFIG";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl HttpSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, created on first start.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("toko.db")
}

fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Auto-cancel sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Turn off when another process runs the sweep.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between sweeps.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    60
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        SchedulerSettings {
            enabled: true,
            interval_secs: default_interval(),
        }
    }
}

impl SchedulerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$TOKO_CONFIG`, or the platform config dir)
    /// 3. Environment variables
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let path = config_path
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading server config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// `~/.config/toko-pos/toko.toml` and platform equivalents.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "toko", "toko-pos")
            .map(|dirs| dirs.config_dir().join("toko.toml"))
    }

    /// Applies `TOKO_*` overrides read through `lookup`.
    ///
    /// ## Supported Variables
    /// - `TOKO_DB_PATH`: database file
    /// - `TOKO_BIND_ADDR`: listener address
    /// - `TOKO_PORT`: listener port
    /// - `TOKO_SWEEP_INTERVAL_SECS`: seconds between sweeps
    /// - `TOKO_SCHEDULER_ENABLED`: `true` / `false`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("TOKO_DB_PATH") {
            debug!(path = %path, "DB path overridden by env");
            self.database.path = PathBuf::from(path);
        }

        if let Some(addr) = lookup("TOKO_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("TOKO_PORT") {
            self.server.port = parse_value("TOKO_PORT", &port)?;
        }

        if let Some(secs) = lookup("TOKO_SWEEP_INTERVAL_SECS") {
            self.scheduler.interval_secs = parse_value("TOKO_SWEEP_INTERVAL_SECS", &secs)?;
        }

        if let Some(enabled) = lookup("TOKO_SCHEDULER_ENABLED") {
            self.scheduler.enabled = parse_value("TOKO_SCHEDULER_ENABLED", &enabled)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::MustBePositive("server.port"));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::MustBePositive("scheduler.interval_secs"));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::MustBePositive("database.max_connections"));
        }
        Ok(())
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.scheduler.interval(), Duration::from_secs(60));
        assert!(config.scheduler.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            [server]
            port = 9000

            [scheduler]
            interval_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.scheduler.interval_secs, 5);
        assert!(config.scheduler.enabled);
        assert_eq!(config.database.path, PathBuf::from("toko.db"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let err = ServerConfig::from_toml("[server]\nport = \"eighty\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = ServerConfig::from_toml("[server]\nport = 9000").unwrap();
        config
            .apply_overrides(env(&[
                ("TOKO_PORT", "7070"),
                ("TOKO_DB_PATH", "/tmp/toko-test.db"),
                ("TOKO_SCHEDULER_ENABLED", "false"),
                ("TOKO_SWEEP_INTERVAL_SECS", "15"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 7070);
        assert_eq!(config.database.path, PathBuf::from("/tmp/toko-test.db"));
        assert!(!config.scheduler.enabled);
        assert_eq!(config.scheduler.interval_secs, 15);
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_overrides(env(&[("TOKO_PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "TOKO_PORT"));
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = ServerConfig::default();
        config.scheduler.interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MustBePositive("scheduler.interval_secs"))
        ));

        let mut config = ServerConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toko.toml");
        std::fs::write(&path, "[database]\nmax_connections = 3\n").unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.db_config().max_connections, 3);
    }
}
