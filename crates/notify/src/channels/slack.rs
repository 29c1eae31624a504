//! Slack webhook notification channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use super::{ChannelOptions, NotifyChannel};
use crate::error::ChannelError;
use crate::events::Severity;

/// Footer shown under every Slack attachment.
const FOOTER: &str = "Velero Notifications";

/// Slack transport settings.
#[derive(Debug, Clone, Default)]
pub struct SlackConfig {
    /// Incoming webhook URL
    pub webhook_url: String,
    /// Target channel override (empty keeps the webhook's default)
    pub channel: String,
    /// Sender display name
    pub username: String,
}

/// Slack webhook notification channel.
pub struct SlackChannel {
    config: SlackConfig,
    options: ChannelOptions,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create a Slack channel, rejecting an empty webhook URL.
    pub fn new(config: SlackConfig, options: ChannelOptions) -> Result<Self, ChannelError> {
        if config.webhook_url.trim().is_empty() {
            return Err(ChannelError::NotConfigured(
                "slack webhook_url is empty".to_string(),
            ));
        }

        Ok(Self {
            config,
            options,
            client: reqwest::Client::new(),
        })
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Format text as a Slack webhook payload.
    fn format_payload(&self, text: &str, severity: Severity) -> SlackPayload {
        let attachment = SlackAttachment {
            fallback: text.to_string(),
            color: severity.color().to_string(),
            author_name: non_empty(&self.config.username),
            text: text.to_string(),
            fields: vec![SlackField {
                title: "Status".to_string(),
                value: severity.as_str().to_string(),
                short: true,
            }],
            footer: FOOTER.to_string(),
            ts: chrono::Utc::now().timestamp(),
        };

        SlackPayload {
            channel: non_empty(&self.config.channel),
            username: non_empty(&self.config.username),
            attachments: vec![attachment],
        }
    }
}

#[async_trait]
impl NotifyChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn options(&self) -> &ChannelOptions {
        &self.options
    }

    async fn deliver(&self, text: &str, severity: Severity) -> Result<(), ChannelError> {
        let payload = self.format_payload(text, severity);

        debug!(channel = "slack", status = %severity, "Sending notification");

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            debug!(channel = "slack", "Notification sent successfully");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            warn!(
                channel = "slack",
                status = %status,
                body = %body,
                "Slack webhook request failed"
            );

            Err(ChannelError::Rejected {
                service: "Slack",
                status: status.as_u16(),
                body,
            })
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// =============================================================================
// Slack API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SlackPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    fallback: String,
    color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_name: Option<String>,
    text: String,
    fields: Vec<SlackField>,
    footer: String,
    ts: i64,
}

#[derive(Debug, Serialize)]
struct SlackField {
    title: String,
    value: String,
    short: bool,
}
