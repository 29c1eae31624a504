//! YAML configuration for the backup monitor.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{
    ChannelOptions, EmailChannel, EmailConfig, NotifyChannel, SlackChannel, SlackConfig,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Shortest allowed polling interval in seconds.
pub const MIN_CHECK_INTERVAL_SECS: i64 = 2;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,

    /// Namespace holding the Velero `Backup` resources
    pub namespace: String,

    /// Seconds between polls; anything below the minimum, negatives
    /// included, is raised to it
    pub check_interval: i64,

    /// Upper bound in seconds for a single channel delivery
    pub delivery_timeout: u64,

    pub notifications: NotificationsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            namespace: "velero".to_string(),
            check_interval: 60,
            delivery_timeout: notify::DEFAULT_DELIVERY_TIMEOUT.as_secs(),
            notifications: NotificationsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is not set
    pub level: String,
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Prepended to every message on every channel
    pub notification_prefix: String,
    pub slack: SlackSettings,
    pub email: EmailSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SlackSettings {
    pub enabled: bool,
    pub failures_only: bool,
    pub webhook_url: String,
    pub channel: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailSettings {
    pub enabled: bool,
    pub failures_only: bool,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            failures_only: false,
            smtp_server: String::new(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            to: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse configuration from YAML text, applying defaults and clamps.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let mut config: Self = serde_yaml::from_str(raw).context("Invalid config YAML")?;
        config.normalize();
        Ok(config)
    }

    fn normalize(&mut self) {
        if self.namespace.is_empty() {
            self.namespace = "velero".to_string();
        }
        if self.check_interval < MIN_CHECK_INTERVAL_SECS {
            self.check_interval = MIN_CHECK_INTERVAL_SECS;
        }
        if self.delivery_timeout == 0 {
            self.delivery_timeout = 1;
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval.unsigned_abs())
    }

    #[must_use]
    pub const fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout)
    }
}

impl NotificationsConfig {
    /// Build the enabled channels.
    ///
    /// A channel with invalid transport settings is logged and left out.
    pub fn channels(&self, http: &reqwest::Client) -> Vec<Arc<dyn NotifyChannel>> {
        let mut channels: Vec<Arc<dyn NotifyChannel>> = vec![];

        if self.slack.enabled {
            let options = ChannelOptions {
                enabled: true,
                failures_only: self.slack.failures_only,
                prefix: self.notification_prefix.clone(),
            };
            let config = SlackConfig {
                webhook_url: self.slack.webhook_url.clone(),
                channel: self.slack.channel.clone(),
                username: self.slack.username.clone(),
            };
            match SlackChannel::new(config, options) {
                Ok(slack) => {
                    info!(failures_only = self.slack.failures_only, "Slack notifications enabled");
                    channels.push(Arc::new(slack.with_client(http.clone())));
                }
                Err(e) => error!(error = %e, "Failed to initialize Slack notifier"),
            }
        }

        if self.email.enabled {
            let options = ChannelOptions {
                enabled: true,
                failures_only: self.email.failures_only,
                prefix: self.notification_prefix.clone(),
            };
            let config = EmailConfig {
                smtp_server: self.email.smtp_server.clone(),
                smtp_port: self.email.smtp_port,
                username: self.email.username.clone(),
                password: self.email.password.clone(),
                from: self.email.from.clone(),
                to: self.email.to.clone(),
            };
            match EmailChannel::new(config, options) {
                Ok(email) => {
                    info!(failures_only = self.email.failures_only, "Email notifications enabled");
                    channels.push(Arc::new(email));
                }
                Err(e) => error!(error = %e, "Failed to initialize Email notifier"),
            }
        }

        if channels.is_empty() {
            warn!("No notification channels configured");
        }

        channels
    }
}
