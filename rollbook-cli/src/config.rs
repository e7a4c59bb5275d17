use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rollbook_store::config::{self as store_config, ENV_DBNAME, ENV_HOST, ENV_PASSWORD, ENV_PORT, ENV_USER};
use rollbook_store::{DatabaseConfig, RollbookConfig};
use tracing::debug;

/// Load environment variables from .env files, returning the files loaded
///
/// Priority order (highest to lowest):
/// 1. Environment variables already set
/// 2. Current directory .env
/// 3. ~/.rollbook/.env
///
/// Runs before tracing is initialized, so the caller logs the result.
pub fn load_dotenv() -> Vec<PathBuf> {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded_from.push(path);
    }

    if let Some(env_file) = store_config::config_dir().map(|dir| dir.join(".env")) {
        // dotenvy doesn't overwrite existing vars
        if env_file.exists() && dotenvy::from_path(&env_file).is_ok() {
            loaded_from.push(env_file);
        }
    }

    loaded_from
}

/// Database connection flags shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Database server host
    #[arg(long, global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Database server port
    #[arg(long, global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Database user
    #[arg(long, global = true, env = ENV_USER)]
    pub user: Option<String>,

    /// Database password
    #[arg(long, global = true, env = ENV_PASSWORD, hide_env_values = true)]
    pub password: Option<String>,

    /// Database name
    #[arg(long, global = true, env = ENV_DBNAME)]
    pub dbname: Option<String>,
}

impl ConnectionArgs {
    /// Layer flags (and their env vars) over a base config
    pub fn apply(&self, mut config: DatabaseConfig) -> DatabaseConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(dbname) = &self.dbname {
            config.dbname = dbname.clone();
        }
        config
    }

    /// Effective config: defaults, then config file, then env vars and flags
    pub fn resolve(&self) -> Result<DatabaseConfig> {
        let file = RollbookConfig::load().context("Failed to load config file")?;
        let config = self.apply(file.database);
        debug!(?config, "resolved database config");
        Ok(config)
    }
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show config file path
    Path,
    /// Show the effective connection settings (password hidden)
    Show,
}

pub fn run_config(args: ConfigArgs, connection: &ConnectionArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(connection),
    }
}

fn run_path() -> Result<()> {
    let path = store_config::config_path().context("Could not determine home directory")?;
    println!("{}", path.display());
    Ok(())
}

fn run_show(connection: &ConnectionArgs) -> Result<()> {
    let mut database = connection.resolve()?;
    if !database.password.is_empty() {
        database.password = "********".to_string();
    }

    let rendered = toml::to_string_pretty(&RollbookConfig { database })
        .context("Failed to render config")?;
    print!("{}", rendered);
    Ok(())
}
