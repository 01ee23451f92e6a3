//! Process configuration read from the environment at startup.

use std::time::Duration;

use thiserror::Error;

use crate::webhooks::policies::PluginRegistry;
use crate::webhooks::policies::queue::DEFAULT_QUEUE_LOOKUP_TIMEOUT;
use crate::webhooks::{WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WEBHOOK_PORT};

/// Default health/metrics server port
pub const HEALTH_PORT: u16 = 8080;

/// Errors raised while reading configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to a value that could not be parsed
    #[error("invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the webhook binary
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Port of the TLS admission endpoint
    pub webhook_port: u16,
    /// PEM certificate served by the webhook
    pub cert_path: String,
    /// PEM private key for `cert_path`
    pub key_path: String,
    /// Port of the health/metrics server
    pub health_port: u16,
    /// Upper bound on a single queue lookup
    pub queue_lookup_timeout: Duration,
    /// Known job plugins
    pub plugins: PluginRegistry,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            webhook_port: WEBHOOK_PORT,
            cert_path: WEBHOOK_CERT_PATH.to_string(),
            key_path: WEBHOOK_KEY_PATH.to_string(),
            health_port: HEALTH_PORT,
            queue_lookup_timeout: DEFAULT_QUEUE_LOOKUP_TIMEOUT,
            plugins: PluginRegistry::default(),
        }
    }
}

impl WebhookConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("WEBHOOK_PORT") {
            config.webhook_port = parse_port("WEBHOOK_PORT", value)?;
        }
        if let Some(value) = lookup("WEBHOOK_CERT_PATH") {
            config.cert_path = value;
        }
        if let Some(value) = lookup("WEBHOOK_KEY_PATH") {
            config.key_path = value;
        }
        if let Some(value) = lookup("HEALTH_PORT") {
            config.health_port = parse_port("HEALTH_PORT", value)?;
        }
        if let Some(value) = lookup("QUEUE_LOOKUP_TIMEOUT_MS") {
            let millis = value
                .trim()
                .parse::<u64>()
                .map_err(|e| invalid("QUEUE_LOOKUP_TIMEOUT_MS", &value, e.to_string()))?;
            if millis == 0 {
                return Err(invalid(
                    "QUEUE_LOOKUP_TIMEOUT_MS",
                    &value,
                    "must be greater than zero".to_string(),
                ));
            }
            config.queue_lookup_timeout = Duration::from_millis(millis);
        }
        if let Some(value) = lookup("KNOWN_JOB_PLUGINS") {
            config.plugins = PluginRegistry::from_names(value.split(','));
        }

        Ok(config)
    }
}

fn parse_port(var: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|e| invalid(var, &value, e.to_string()))
}

fn invalid(var: &'static str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason,
    }
}
