use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// `APPLICANTS_DIR` is required; everything else has a sensible default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory containing one subdirectory per applicant.
    pub applicants_dir: PathBuf,
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            applicants_dir: PathBuf::from(require_env("APPLICANTS_DIR")?),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://screener.db?mode=rwc".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
