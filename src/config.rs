//! Configuration module for environment variables and client settings

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};
use url::Url;

/// Backend address used when `API_BASE_URL` is not set
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Default location of the persisted auth token
pub const DEFAULT_TOKEN_PATH: &str = ".sustentatech/authToken";

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend REST API base URL, without trailing slash
    pub api_base_url: String,

    /// File backing the single persisted token key
    pub token_path: PathBuf,

    /// Notification feed settings
    pub notifications: NotificationConfig,

    /// User agent sent with every request
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Polling period while a session is active
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            notifications: NotificationConfig {
                poll_interval: Duration::from_secs(10),
            },
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_base_url = env::var("API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        Ok(Self {
            api_base_url: normalize_base_url(&api_base_url)?,

            token_path: env::var("AUTH_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_PATH)),

            notifications: NotificationConfig {
                poll_interval: parse_poll_interval(env::var("NOTIFICATION_POLL_SECS").ok().as_deref())?,
            },

            user_agent: env::var("HTTP_USER_AGENT")
                .unwrap_or_else(|_| default_user_agent()),
        })
    }
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Polling period in whole seconds; unset or unparsable falls back to 10, zero is rejected
pub fn parse_poll_interval(raw: Option<&str>) -> Result<Duration> {
    let secs = raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(10);
    if secs == 0 {
        anyhow::bail!("NOTIFICATION_POLL_SECS must be at least 1");
    }
    Ok(Duration::from_secs(secs))
}

/// Validate a base URL and strip its trailing slash so paths can be appended verbatim
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim())
        .with_context(|| format!("API_BASE_URL is not a valid URL: {raw}"))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("API_BASE_URL must use http or https, got {}", parsed.scheme());
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
