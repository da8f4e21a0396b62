use std::{env, net::SocketAddr, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_JIKAN_BASE_URL: &str = "https://api.jikan.moe/v4";

/// Typed configuration for the checker.
///
/// Only the bot token is required; everything else has a default matching the
/// behaviour of the hosted bot (hourly polling, 15s request timeout, ...).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub telegram_allowed_users: Vec<i64>,

    // Catalog
    pub jikan_base_url: String,
    pub request_timeout: Duration,
    pub request_spacing: Duration,
    pub per_endpoint_limit: usize,

    // Scheduling
    pub poll_interval: Duration,
    pub recovery_delay: Duration,

    // Rendering
    pub detailed_entry_limit: usize,
    pub synopsis_max_chars: usize,

    // Liveness
    pub liveness_addr: SocketAddr,
}

impl Config {
    /// Load from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        // `.env` never overrides variables that are already set.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }
        let telegram_allowed_users = parse_csv_i64(lookup("TELEGRAM_ALLOWED_USERS"));

        let jikan_base_url = lookup("JIKAN_BASE_URL")
            .and_then(non_empty)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_JIKAN_BASE_URL.to_string());

        let num = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let request_timeout = Duration::from_secs(num("REQUEST_TIMEOUT_SECS").unwrap_or(15));
        let request_spacing = Duration::from_millis(num("REQUEST_SPACING_MS").unwrap_or(1000));
        let per_endpoint_limit = num("PER_ENDPOINT_LIMIT").unwrap_or(10) as usize;

        let poll_interval = Duration::from_secs(num("POLL_INTERVAL_SECS").unwrap_or(3600).max(1));
        let recovery_delay = Duration::from_secs(num("RECOVERY_DELAY_SECS").unwrap_or(600).max(1));

        let detailed_entry_limit = num("DETAILED_ENTRY_LIMIT").unwrap_or(5) as usize;
        let synopsis_max_chars = num("SYNOPSIS_MAX_CHARS").unwrap_or(200) as usize;

        let liveness_addr = lookup("LIVENESS_ADDR")
            .and_then(|s| s.trim().parse::<SocketAddr>().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            jikan_base_url,
            request_timeout,
            request_spacing,
            per_endpoint_limit,
            poll_interval,
            recovery_delay,
            detailed_entry_limit,
            synopsis_max_chars,
            liveness_addr,
        })
    }
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
