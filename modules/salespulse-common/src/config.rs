use std::time::Duration;

use anyhow::{Context, Result};

use crate::Platform;

pub const DEFAULT_CAKTO_API_URL: &str = "https://api.cakto.com.br/v1";

/// Shared secrets, one per platform. A platform without a secret rejects
/// every notification.
#[derive(Debug, Clone, Default)]
pub struct WebhookSecrets {
    pub braip: Option<String>,
    pub hubla: Option<String>,
    pub kirvano: Option<String>,
    pub cakto: Option<String>,
}

impl WebhookSecrets {
    /// The configured secret for a platform. Empty strings count as unset.
    pub fn for_platform(&self, platform: Platform) -> Option<&str> {
        let secret = match platform {
            Platform::Braip => &self.braip,
            Platform::Hubla => &self.hubla,
            Platform::Kirvano => &self.kirvano,
            Platform::Cakto => &self.cakto,
        };
        secret.as_deref().filter(|s| !s.is_empty())
    }

    pub fn with(mut self, platform: Platform, secret: impl Into<String>) -> Self {
        let slot = match platform {
            Platform::Braip => &mut self.braip,
            Platform::Hubla => &mut self.hubla,
            Platform::Kirvano => &mut self.kirvano,
            Platform::Cakto => &mut self.cakto,
        };
        *slot = Some(secret.into());
        self
    }
}

/// Application configuration loaded from environment variables once at
/// startup and passed explicitly to the components that need it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Database
    pub database_url: String,
    pub db_max_connections: u32,

    // Web server
    pub host: String,
    pub port: u16,

    // Ingestion
    pub webhook_secrets: WebhookSecrets,
    pub adapter_timeout: Duration,

    // Cakto order sync
    pub cakto_api_key: Option<String>,
    pub cakto_api_url: String,

    // External report renderer (PDF / Excel)
    pub report_renderer_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            db_max_connections: 10,
            host: "0.0.0.0".to_string(),
            port: 5000,
            webhook_secrets: WebhookSecrets::default(),
            adapter_timeout: Duration::from_millis(2000),
            cakto_api_key: None,
            cakto_api_url: DEFAULT_CAKTO_API_URL.to_string(),
            report_renderer_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parse_env("PORT", defaults.port)?,
            webhook_secrets: WebhookSecrets {
                braip: optional_env("BRAIP_WEBHOOK_SECRET"),
                hubla: optional_env("HUBLA_WEBHOOK_SECRET"),
                kirvano: optional_env("KIRVANO_WEBHOOK_SECRET"),
                cakto: optional_env("CAKTO_WEBHOOK_SECRET"),
            },
            adapter_timeout: Duration::from_millis(parse_env("ADAPTER_TIMEOUT_MS", 2000u64)?),
            cakto_api_key: optional_env("CAKTO_API_KEY"),
            cakto_api_url: std::env::var("CAKTO_API_URL").unwrap_or(defaults.cakto_api_url),
            report_renderer_url: optional_env("REPORT_RENDERER_URL"),
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().take(3).map(char::len_utf8).sum::<usize>();
            format!("{}...({} chars)", &val[..n], val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => preview(v),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  BRAIP_WEBHOOK_SECRET: {}", preview_opt(&self.webhook_secrets.braip));
        tracing::info!("  HUBLA_WEBHOOK_SECRET: {}", preview_opt(&self.webhook_secrets.hubla));
        tracing::info!("  KIRVANO_WEBHOOK_SECRET: {}", preview_opt(&self.webhook_secrets.kirvano));
        tracing::info!("  CAKTO_WEBHOOK_SECRET: {}", preview_opt(&self.webhook_secrets.cakto));
        tracing::info!("  CAKTO_API_KEY: {}", preview_opt(&self.cakto_api_key));
        tracing::info!("  REPORT_RENDERER_URL: {}", preview_opt(&self.report_renderer_url));
        tracing::info!("  ADAPTER_TIMEOUT_MS: {}", self.adapter_timeout.as_millis());
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_counts_as_unset() {
        let secrets = WebhookSecrets::default()
            .with(Platform::Braip, "")
            .with(Platform::Hubla, "s3cret");
        assert_eq!(secrets.for_platform(Platform::Braip), None);
        assert_eq!(secrets.for_platform(Platform::Hubla), Some("s3cret"));
        assert_eq!(secrets.for_platform(Platform::Cakto), None);
    }

    #[test]
    fn defaults_are_usable() {
        let config = AppConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.adapter_timeout, Duration::from_secs(2));
        assert_eq!(config.cakto_api_url, DEFAULT_CAKTO_API_URL);
    }
}
