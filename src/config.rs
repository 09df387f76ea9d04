use std::env;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Directory of the daily rolling log file.
    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let log_level = env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "debug".to_string())
            .parse()
            .context("LOG_LEVEL must be one of trace, debug, info, warn, error")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level,
        })
    }
}
