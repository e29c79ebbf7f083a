use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Upper bound on a single upload request body.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_TIMEOUT_SECS: u64 = 30 * 60;

/// Application configuration loaded from environment variables.
/// Only malformed values fail startup; everything has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub production: bool,
    pub rust_log: String,
    /// Read by the scoring client when a session initializes it, not at startup.
    pub anthropic_api_key: Option<String>,
    pub scoring_model: String,
    pub upload_root: PathBuf,
    pub processing_timeout: Duration,
    pub max_concurrent_sessions: usize,
    pub scoring_concurrency: usize,
    pub keep_session_files: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let production = lookup("APP_ENV")
            .map(|v| v.trim().eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let default_level = if production { "info" } else { "debug" };

        Ok(Config {
            port: parse_or("PORT", &lookup, DEFAULT_PORT)?,
            production,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| default_level.to_string()),
            anthropic_api_key: lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()),
            scoring_model: lookup("SCORING_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            upload_root: lookup("UPLOAD_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("temp")),
            processing_timeout: Duration::from_secs(parse_or(
                "PROCESSING_TIMEOUT_SECS",
                &lookup,
                DEFAULT_TIMEOUT_SECS,
            )?),
            max_concurrent_sessions: parse_or("MAX_CONCURRENT_SESSIONS", &lookup, 4usize)?.max(1),
            scoring_concurrency: parse_or("SCORING_CONCURRENCY", &lookup, 4usize)?.max(1),
            keep_session_files: parse_or("KEEP_SESSION_FILES", &lookup, false)?,
        })
    }

    /// Production binds every interface; local development stays on loopback.
    pub fn bind_ip(&self) -> IpAddr {
        if self.production {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
