//! Connection configuration for the record store
//!
//! Priority order (highest to lowest):
//! 1. Explicit overrides (CLI flags)
//! 2. `ROLLBOOK_DB_*` environment variables
//! 3. `[database]` table in ~/.rollbook/config.toml
//! 4. Built-in defaults

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use tracing::debug;

use crate::error::{Result, StoreError};

pub const ENV_HOST: &str = "ROLLBOOK_DB_HOST";
pub const ENV_PORT: &str = "ROLLBOOK_DB_PORT";
pub const ENV_USER: &str = "ROLLBOOK_DB_USER";
pub const ENV_PASSWORD: &str = "ROLLBOOK_DB_PASSWORD";
pub const ENV_DBNAME: &str = "ROLLBOOK_DB_NAME";

/// Get the rollbook config directory path (~/.rollbook)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".rollbook"))
}

/// Get the default config file path (~/.rollbook/config.toml)
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Top-level TOML configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RollbookConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Where and how to reach the PostgreSQL server.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_dbname")]
    pub dbname: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            dbname: default_dbname(),
        }
    }
}

// Password stays out of logs
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &redacted(&self.password))
            .field("dbname", &self.dbname)
            .finish()
    }
}

fn redacted(password: &str) -> &'static str {
    if password.is_empty() {
        ""
    } else {
        "********"
    }
}

// Default value functions for serde
fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_dbname() -> String {
    "students".to_string()
}

impl RollbookConfig {
    /// Load from ~/.rollbook/config.toml, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from an explicit path. A missing or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StoreError::config(format!("failed to read {}: {}", path.display(), e)))?;
        let config = toml::from_str::<RollbookConfig>(&contents)
            .map_err(|e| StoreError::config(format!("failed to parse {}: {}", path.display(), e)))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

impl DatabaseConfig {
    /// Overlay `ROLLBOOK_DB_*` environment variables.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary lookup (env-style keys).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| StoreError::config(format!("{} is not a valid port: {:?}", ENV_PORT, port)))?;
        }
        if let Some(user) = lookup(ENV_USER) {
            self.user = user;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.password = password;
        }
        if let Some(dbname) = lookup(ENV_DBNAME) {
            self.dbname = dbname;
        }
        Ok(self)
    }

    /// `user@host:port/dbname`, for logs and error messages.
    pub fn target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }

    /// Build sqlx connect options from this config.
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.dbname);

        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}
