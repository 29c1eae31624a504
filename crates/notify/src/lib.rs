//! Notification routing for backup status reports.
//!
//! This crate classifies composed backup messages by severity and fans them
//! out to Slack, email, and any other [`NotifyChannel`] implementation.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use notify::{ChannelOptions, Notification, Notifier, SlackChannel, SlackConfig};
//!
//! # async fn run() -> Result<(), notify::ChannelError> {
//! let slack = SlackChannel::new(
//!     SlackConfig {
//!         webhook_url: "https://hooks.slack.com/services/T000/B000/XXX".to_string(),
//!         ..Default::default()
//!     },
//!     ChannelOptions { enabled: true, ..Default::default() },
//! )?;
//!
//! let notifier = Notifier::with_channels(vec![Arc::new(slack)]);
//! notifier
//!     .dispatch(Notification::new("Backup nightly-01 completed successfully."))
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`classify`] derives a [`Severity`] from message text
//! - [`NotifyChannel`] is the delivery interface for a single transport
//! - [`Notifier`] applies each channel's prefix and failures-only filter,
//!   then delivers with a timeout, isolating failures per channel

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod classify;
pub mod error;
pub mod events;

pub use channels::email::{EmailChannel, EmailConfig};
pub use channels::slack::{SlackChannel, SlackConfig};
pub use channels::{ChannelOptions, NotifyChannel};
pub use classify::classify;
pub use error::ChannelError;
pub use events::{Notification, Severity};

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default upper bound for a single channel delivery.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// What happened to one notification on one channel.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// Transport accepted the message
    Delivered(Severity),
    /// Failures-only channel skipped a clean completion
    Suppressed(Severity),
    /// Channel is switched off
    Disabled,
    /// Transport reported an error (or timed out)
    Failed(ChannelError),
}

/// Per-channel result of a [`Notifier::dispatch`] call.
#[derive(Debug)]
pub struct Dispatch {
    pub channel: &'static str,
    pub outcome: DeliveryOutcome,
}

impl Dispatch {
    #[must_use]
    pub const fn delivered(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Delivered(_))
    }
}

/// Central notification dispatcher.
///
/// Channels are tried one after another. A failing or slow channel never
/// prevents delivery to the channels after it.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
    timeout: Duration,
}

impl Notifier {
    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self {
            channels,
            timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    /// Create a notifier with no channels.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    /// Bound each delivery attempt by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if any notification channel is enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        self.channel_count() > 0
    }

    /// Get the number of enabled channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.iter().filter(|c| c.options().enabled).count()
    }

    /// Send a notification to every enabled channel and wait for the results.
    ///
    /// Errors are logged with the channel name and returned in the outcome
    /// list; they are never propagated.
    pub async fn dispatch(&self, notification: Notification) -> Vec<Dispatch> {
        let mut results = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let outcome = self.deliver_one(channel.as_ref(), &notification).await;
            results.push(Dispatch {
                channel: channel.name(),
                outcome,
            });
        }

        results
    }

    async fn deliver_one(
        &self,
        channel: &dyn NotifyChannel,
        notification: &Notification,
    ) -> DeliveryOutcome {
        let name = channel.name();
        let options = channel.options();

        if !options.enabled {
            debug!(channel = name, "Channel disabled, skipping");
            return DeliveryOutcome::Disabled;
        }

        let text = format!("{}{}", options.prefix, notification.text());
        let severity = classify(&text);

        if options.failures_only && !severity.is_failure() {
            debug!(
                channel = name,
                status = %severity,
                "Failures-only channel, skipping"
            );
            return DeliveryOutcome::Suppressed(severity);
        }

        match tokio::time::timeout(self.timeout, channel.deliver(&text, severity)).await {
            Ok(Ok(())) => {
                debug!(channel = name, status = %severity, "Notification sent");
                DeliveryOutcome::Delivered(severity)
            }
            Ok(Err(e)) => {
                error!(channel = name, error = %e, "Error sending notification");
                DeliveryOutcome::Failed(e)
            }
            Err(_) => {
                warn!(
                    channel = name,
                    timeout_secs = self.timeout.as_secs(),
                    "Notification delivery timed out"
                );
                DeliveryOutcome::Failed(ChannelError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingChannel {
        name: &'static str,
        options: ChannelOptions,
        sent: Mutex<Vec<(String, Severity)>>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl RecordingChannel {
        fn new(name: &'static str, failures_only: bool, prefix: &str) -> Self {
            Self {
                name,
                options: ChannelOptions {
                    enabled: true,
                    failures_only,
                    prefix: prefix.to_string(),
                },
                sent: Mutex::new(vec![]),
                fail: false,
                delay: None,
            }
        }

        fn sent(&self) -> Vec<(String, Severity)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotifyChannel for RecordingChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        fn options(&self) -> &ChannelOptions {
            &self.options
        }

        async fn deliver(&self, text: &str, severity: Severity) -> Result<(), ChannelError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.sent.lock().unwrap().push((text.to_string(), severity));
            if self.fail {
                return Err(ChannelError::Rejected {
                    service: "test",
                    status: 502,
                    body: "bad gateway".to_string(),
                });
            }
            Ok(())
        }
    }

    fn notifier_for(channels: &[&Arc<RecordingChannel>]) -> Notifier {
        Notifier::with_channels(
            channels
                .iter()
                .map(|c| Arc::clone(*c) as Arc<dyn NotifyChannel>)
                .collect(),
        )
    }

    #[test]
    fn test_disabled_notifier() {
        let notifier = Notifier::disabled();
        assert!(!notifier.has_channels());
        assert_eq!(notifier.channel_count(), 0);
    }

    #[tokio::test]
    async fn test_prefix_applied_before_delivery() {
        let channel = Arc::new(RecordingChannel::new("rec", false, "[prod] "));
        let notifier = notifier_for(&[&channel]);

        let results = notifier
            .dispatch(Notification::new("Backup b1 completed successfully."))
            .await;

        assert_eq!(results.len(), 1);
        assert!(results[0].delivered());
        assert_eq!(
            channel.sent(),
            vec![(
                "[prod] Backup b1 completed successfully.".to_string(),
                Severity::Completed
            )]
        );
    }

    #[tokio::test]
    async fn test_failures_only_suppresses_completed() {
        let channel = Arc::new(RecordingChannel::new("rec", true, ""));
        let notifier = notifier_for(&[&channel]);

        let results = notifier
            .dispatch(Notification::new("Backup b1 completed successfully."))
            .await;

        assert!(matches!(
            results[0].outcome,
            DeliveryOutcome::Suppressed(Severity::Completed)
        ));
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failures_only_delivers_everything_else() {
        let channel = Arc::new(RecordingChannel::new("rec", true, ""));
        let notifier = notifier_for(&[&channel]);

        for text in [
            "Backup b1 finished with status: Failed.",
            "Backup b1 finished with status: PartiallyFailed.",
            "Backup b1 finished with status: FinalizingPartiallyFailed.",
            "Backup b1 finished with status: Deleting.",
        ] {
            notifier.dispatch(Notification::new(text)).await;
        }

        let severities: Vec<_> = channel.sent().into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Failed,
                Severity::PartiallyFailed,
                Severity::FinalizingPartiallyFailed,
                Severity::Unknown,
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_channel_does_not_block_others() {
        let mut broken = RecordingChannel::new("broken", false, "");
        broken.fail = true;
        let broken = Arc::new(broken);
        let healthy = Arc::new(RecordingChannel::new("healthy", false, ""));
        let notifier = notifier_for(&[&broken, &healthy]);

        let results = notifier
            .dispatch(Notification::new("Backup b1 finished with status: Failed."))
            .await;

        assert!(matches!(results[0].outcome, DeliveryOutcome::Failed(_)));
        assert!(results[1].delivered());
        assert_eq!(broken.sent().len(), 1);
        assert_eq!(healthy.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_channel_skipped() {
        let mut off = RecordingChannel::new("off", false, "");
        off.options.enabled = false;
        let off = Arc::new(off);
        let notifier = notifier_for(&[&off]);

        assert_eq!(notifier.channel_count(), 0);
        let results = notifier.dispatch(Notification::new("anything")).await;
        assert!(matches!(results[0].outcome, DeliveryOutcome::Disabled));
        assert!(off.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_channel_times_out() {
        let mut slow = RecordingChannel::new("slow", false, "");
        slow.delay = Some(Duration::from_secs(120));
        let slow = Arc::new(slow);
        let fast = Arc::new(RecordingChannel::new("fast", false, ""));
        let notifier = notifier_for(&[&slow, &fast])
            .with_timeout(Duration::from_secs(5));

        let results = notifier
            .dispatch(Notification::new("Backup b1 finished with status: Failed."))
            .await;

        assert!(matches!(
            results[0].outcome,
            DeliveryOutcome::Failed(ChannelError::Timeout(_))
        ));
        assert!(slow.sent().is_empty());
        assert_eq!(fast.sent().len(), 1);
    }
}
