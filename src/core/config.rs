//! # Configuration
//!
//! Environment-driven configuration for the reminder daemon and the daily sweep.
//! Binaries call `dotenvy::dotenv()` first so a local `.env` file is honoured.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Separate request timeout for the push gateway
//! - 1.1.0: Derive platform capability from push/periodic-sync settings
//! - 1.0.0: Initial release with database, email and push settings

use anyhow::{anyhow, Result};
use std::env;
use std::time::Duration;

use crate::features::channels::PlatformSupport;

pub const DEFAULT_DATABASE_PATH: &str = "connectkeep.db";
pub const DEFAULT_APP_URL: &str = "https://connectkeep.app";
const DEFAULT_EMAIL_TIMEOUT_SECS: u64 = 15;
const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub log_level: String,
    /// HTTP endpoint of the send-email function
    pub email_endpoint: Option<String>,
    pub email_api_key: Option<String>,
    pub email_timeout: Duration,
    /// Push gateway receiving `{title, body, data}` payloads
    pub push_endpoint: Option<String>,
    pub push_timeout: Duration,
    pub push_permission_granted: bool,
    pub periodic_sync: bool,
    pub app_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let email_endpoint = optional_var("EMAIL_ENDPOINT");
        let email_api_key = optional_var("EMAIL_API_KEY");
        if email_endpoint.is_some() && email_api_key.is_none() {
            return Err(anyhow!(
                "EMAIL_API_KEY must be set when EMAIL_ENDPOINT is configured"
            ));
        }

        Ok(Config {
            database_path: optional_var("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            log_level: optional_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            email_endpoint,
            email_api_key,
            email_timeout: timeout_var("EMAIL_TIMEOUT_SECS", DEFAULT_EMAIL_TIMEOUT_SECS)?,
            push_endpoint: optional_var("PUSH_ENDPOINT"),
            push_timeout: timeout_var("PUSH_TIMEOUT_SECS", DEFAULT_PUSH_TIMEOUT_SECS)?,
            push_permission_granted: parse_flag("PUSH_PERMISSION_GRANTED", true)?,
            periodic_sync: parse_flag("PERIODIC_SYNC", false)?,
            app_url: optional_var("APP_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
        })
    }

    /// Platform support implied by the configured push transport
    pub fn platform_support(&self) -> PlatformSupport {
        match (&self.push_endpoint, self.periodic_sync) {
            (None, _) => PlatformSupport::Unsupported,
            (Some(_), false) => PlatformSupport::PushOnlyNoPeriodicSync,
            (Some(_), true) => PlatformSupport::FullySupported,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(name: &str, default: bool) -> Result<bool> {
    match optional_var(name) {
        None => Ok(default),
        Some(raw) => {
            parse_bool(&raw).ok_or_else(|| anyhow!("Invalid boolean for {}: {}", name, raw))
        }
    }
}

fn timeout_var(name: &str, default_secs: u64) -> Result<Duration> {
    parse_timeout(name, optional_var(name), default_secs)
}

/// Whole seconds from `raw`, or the default when unset
fn parse_timeout(name: &str, raw: Option<String>, default_secs: u64) -> Result<Duration> {
    let secs = match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| anyhow!("Invalid {} '{}': {}", name, raw, e))?,
        None => default_secs,
    };
    Ok(Duration::from_secs(secs))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
