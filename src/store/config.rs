//! Store connection settings read from the environment.
//!
//! Credentials live in `SUPABASE_URL` / `SUPABASE_KEY` (a `.env` file is
//! honored via `dotenvy`). Absence is not fatal at construction time; it
//! surfaces as [`StoreError::MissingCredentials`] when a fetch first needs
//! the connection.

use std::time::Duration;

use super::StoreError;

/// Env var holding the project base URL.
pub const URL_VAR: &str = "SUPABASE_URL";
/// Env var holding the service/anon key.
pub const KEY_VAR: &str = "SUPABASE_KEY";

const TIMEOUT_VAR: &str = "IVY_HTTP_TIMEOUT_SECS";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the backing store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project base URL, without a trailing slash.
    pub url: String,
    /// API key, sent as both `apikey` and bearer token.
    pub key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl StoreConfig {
    /// Read settings from the environment.
    pub fn from_env() -> Result<Self, StoreError> {
        let url = require(URL_VAR)?;
        let key = require(KEY_VAR)?;
        let timeout = dotenvy::var(TIMEOUT_VAR)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            key,
            timeout,
        })
    }
}

fn require(var: &'static str) -> Result<String, StoreError> {
    match dotenvy::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(StoreError::MissingCredentials(var)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
