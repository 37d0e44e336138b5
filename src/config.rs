use std::time::Duration;

use anyhow::{Context, Result};

pub const SERVICE_NAME: &str = "todolist-service";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub log_level: String,
    pub build_env: String,
    pub shutdown_timeout: Duration,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("SERVER_PORT", "3000").parse::<u16>().context("SERVER_PORT must be a valid u16")?;
        let db_max_connections = var("DB_MAX_CONNECTIONS", "5")
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a positive integer")?;
        let shutdown_secs = var("SHUTDOWN_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .context("SHUTDOWN_TIMEOUT_SECS must be a number of seconds")?;

        Ok(Self {
            host: var("SERVER_HOST", "127.0.0.1"),
            port,
            database_url: var("DATABASE_URL", "sqlite://todos.db"),
            db_max_connections,
            log_level: var("LOG_LEVEL", "info"),
            build_env: var("APP_ENV", "development"),
            shutdown_timeout: Duration::from_secs(shutdown_secs),
        })
    }

    pub fn bind_addr(&self) -> String { format!("{}:{}", self.host, self.port) }
}
