use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tasks.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_THEME_FILE: &str = ".tasks-theme.json";

/// Process settings, taken from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub theme_file: PathBuf,
    /// TUI only: log to this file instead of staying silent.
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse().with_context(|| format!("BIND_ADDR {bind_addr:?} is not a socket address"))?;
        let theme_file = lookup("TASKS_THEME_FILE").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_THEME_FILE));
        let log_file = lookup("TASKS_LOG").filter(|v| !v.is_empty()).map(PathBuf::from);
        Ok(Self { database_url, bind_addr, theme_file, log_file })
    }
}
