//! Notification channel implementations.

pub mod email;
pub mod slack;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::events::Severity;

/// Routing options shared by every channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelOptions {
    /// Whether the channel takes part in dispatch at all.
    pub enabled: bool,
    /// Only deliver messages that do not classify as a clean completion.
    pub failures_only: bool,
    /// Text prepended to every message before classification and delivery.
    pub prefix: String,
}

/// Trait for notification channels (Slack, email, ...).
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Routing options for this channel.
    fn options(&self) -> &ChannelOptions;

    /// Deliver already-prefixed text with its classified severity.
    async fn deliver(&self, text: &str, severity: Severity) -> Result<(), ChannelError>;
}
