use std::time::Duration;

use anyhow::{Context, Result};

use crate::tenant::resolver::TenantOptions;

/// Application configuration loaded from environment variables.
/// Startup aborts if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub tenant_api_url: String,
    pub tenant_api_token: Option<String>,
    pub tenant_api_timeout: Option<Duration>,
    pub default_tenant: Option<String>,
    pub auto_detect: bool,
    pub base_domain: Option<String>,
    pub refresh_interval: Duration,
    pub health_interval: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            tenant_api_url: require_env("TENANT_API_URL")?,
            tenant_api_token: optional_env("TENANT_API_TOKEN"),
            tenant_api_timeout: optional_env("TENANT_API_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>().map(Duration::from_secs))
                .transpose()
                .context("TENANT_API_TIMEOUT_SECS must be a whole number of seconds")?,
            default_tenant: optional_env("DEFAULT_TENANT"),
            auto_detect: optional_env("TENANT_AUTO_DETECT")
                .map(|v| v.parse::<bool>())
                .transpose()
                .context("TENANT_AUTO_DETECT must be true or false")?
                .unwrap_or(true),
            base_domain: optional_env("TENANT_BASE_DOMAIN"),
            refresh_interval: seconds_env("TENANT_REFRESH_INTERVAL_SECS", 300)?,
            health_interval: seconds_env("TENANT_HEALTH_INTERVAL_SECS", 300)?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn tenant_options(&self) -> TenantOptions {
        TenantOptions {
            auto_detect: self.auto_detect,
            default_tenant: self.default_tenant.clone(),
            base_domain: self.base_domain.clone(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn seconds_env(key: &str, default: u64) -> Result<Duration> {
    let secs = match optional_env(key) {
        Some(v) => v
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    anyhow::ensure!(secs > 0, "{key} must be greater than zero");
    Ok(Duration::from_secs(secs))
}
