//! Configuration module
//!
//! Client settings are read from the environment (after loading `.env`).

use std::env;
use std::time::Duration;

// Common constants
const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_USER_API_URL: &str = "http://localhost:9521";
const DEFAULT_ENVIRONMENT: &str = "local";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const IDENTITY_TIMEOUT_SECS: u64 = 10;
const PROGRESS_TICK_MS: u64 = 200;

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the file service
    pub api_url: String,
    /// Base URL of the identity service
    pub user_api_url: String,
    pub environment: String,
    pub request_timeout: Duration,
    pub identity_timeout: Duration,
    /// Interval between synthesized upload progress steps
    pub progress_tick: Duration,
    /// Skip identity resolution and act as this user
    pub user_id_override: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_api_url: DEFAULT_USER_API_URL.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            identity_timeout: Duration::from_secs(IDENTITY_TIMEOUT_SECS),
            progress_tick: Duration::from_millis(PROGRESS_TICK_MS),
            user_id_override: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Self {
            api_url: env::var("FILEHUB_API_URL")
                .or_else(|_| env::var("API_URL"))
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            user_api_url: env::var("FILEHUB_USER_API_URL")
                .unwrap_or_else(|_| DEFAULT_USER_API_URL.to_string()),
            environment: env::var("FILEHUB_ENV")
                .unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string()),
            request_timeout: Duration::from_secs(env_number(
                "FILEHUB_REQUEST_TIMEOUT_SECS",
                REQUEST_TIMEOUT_SECS,
            )?),
            identity_timeout: Duration::from_secs(env_number(
                "FILEHUB_IDENTITY_TIMEOUT_SECS",
                IDENTITY_TIMEOUT_SECS,
            )?),
            progress_tick: Duration::from_millis(env_number(
                "FILEHUB_PROGRESS_TICK_MS",
                PROGRESS_TICK_MS,
            )?),
            user_id_override: env::var("FILEHUB_USER_ID")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        validate_url("FILEHUB_API_URL", &self.api_url)?;
        if self.user_id_override.is_none() {
            validate_url("FILEHUB_USER_API_URL", &self.user_api_url)?;
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "FILEHUB_REQUEST_TIMEOUT_SECS must be greater than zero"
            ));
        }
        if self.identity_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "FILEHUB_IDENTITY_TIMEOUT_SECS must be greater than zero"
            ));
        }
        if self.progress_tick.is_zero() {
            return Err(anyhow::anyhow!(
                "FILEHUB_PROGRESS_TICK_MS must be greater than zero"
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        matches!(
            self.environment.to_lowercase().as_str(),
            "production" | "prod"
        )
    }
}

fn env_number(name: &str, default: u64) -> Result<u64, anyhow::Error> {
    parse_number(name, env::var(name).ok(), default)
}

/// Unset means the default; anything else must parse.
fn parse_number(name: &str, raw: Option<String>, default: u64) -> Result<u64, anyhow::Error> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number (got '{}')", name, value)),
    }
}

fn validate_url(name: &str, url: &str) -> Result<(), anyhow::Error> {
    let url = url.trim();
    if url.is_empty() {
        return Err(anyhow::anyhow!("{} must not be empty", name));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow::anyhow!(
            "{} must start with http:// or https:// (got '{}')",
            name,
            url
        ));
    }
    Ok(())
}
