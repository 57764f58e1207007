//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Timing of the profile resolution that follows a sign-in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Wait before the first profile fetch so the backend session can propagate.
    pub settle_delay: Duration,
    pub fetch_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            fetch_attempts: 3,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// Credentials the binary signs in with at startup.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub log_level: Level,
    pub sync: SyncConfig,
    pub credentials: Option<Credentials>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend ---
        let supabase_url = lookup("SUPABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("SUPABASE_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();
        if !supabase_url.starts_with("http://") && !supabase_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "SUPABASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", supabase_url),
            ));
        }
        let supabase_anon_key = lookup("SUPABASE_ANON_KEY")
            .ok_or_else(|| ConfigError::MissingVar("SUPABASE_ANON_KEY".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Profile resolution timing ---
        let defaults = SyncConfig::default();
        let settle_delay = parse_millis(&lookup, "PROFILE_SETTLE_DELAY_MS")?
            .unwrap_or(defaults.settle_delay);
        let retry_backoff = parse_millis(&lookup, "PROFILE_RETRY_BACKOFF_MS")?
            .unwrap_or(defaults.retry_backoff);
        let fetch_attempts = match lookup("PROFILE_FETCH_ATTEMPTS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "PROFILE_FETCH_ATTEMPTS".to_string(),
                        format!("'{}' is not a positive integer", raw),
                    ))
                }
            },
            None => defaults.fetch_attempts,
        };

        // --- Optional startup sign-in ---
        let credentials = match (lookup("FOODSHARE_EMAIL"), lookup("FOODSHARE_PASSWORD")) {
            (Some(email), Some(password)) => Some(Credentials { email, password }),
            _ => None,
        };

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            log_level,
            sync: SyncConfig { settle_delay, fetch_attempts, retry_backoff },
            credentials,
        })
    }
}

fn parse_millis<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<u64>().map(Duration::from_millis).map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), format!("'{}' is not a number of milliseconds", raw))
            })
        })
        .transpose()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
