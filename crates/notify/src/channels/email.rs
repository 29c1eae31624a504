//! Email notification channel using SMTP with STARTTLS.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::{ChannelOptions, NotifyChannel};
use crate::error::ChannelError;
use crate::events::Severity;

/// Subject line used for every notification email.
pub const EMAIL_SUBJECT: &str = "Backup Velero";

/// SMTP transport settings.
#[derive(Debug, Clone, Default)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_server: String,
    /// SMTP server port.
    pub smtp_port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
}

/// Email notification channel.
pub struct EmailChannel {
    config: EmailConfig,
    options: ChannelOptions,
}

impl EmailChannel {
    /// Create an email channel; server and credentials are required.
    pub fn new(config: EmailConfig, options: ChannelOptions) -> Result<Self, ChannelError> {
        if config.smtp_server.is_empty() || config.username.is_empty() || config.password.is_empty()
        {
            return Err(ChannelError::NotConfigured(
                "email requires smtp_server, username and password".to_string(),
            ));
        }
        Ok(Self { config, options })
    }

    /// Build the single plain-text message for `text`.
    fn build_message(&self, text: &str) -> Result<Message, ChannelError> {
        let from: Mailbox = self.config.from.parse()?;
        let to: Mailbox = self.config.to.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(EMAIL_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())?;

        Ok(message)
    }
}

#[async_trait]
impl NotifyChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    fn options(&self) -> &ChannelOptions {
        &self.options
    }

    async fn deliver(&self, text: &str, severity: Severity) -> Result<(), ChannelError> {
        let message = self.build_message(text)?;

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_server)?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build();

        mailer.send(message).await?;

        debug!(
            channel = "email",
            to = %self.config.to,
            status = %severity,
            "Email sent successfully"
        );

        Ok(())
    }
}
