//! Error types for the notification system.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when building or delivering through a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel is missing required transport settings
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote service answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The email could not be assembled (bad address, bad header)
    #[error("Invalid email: {0}")]
    Message(String),

    /// SMTP transport failure
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Delivery did not finish within the configured bound
    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

impl From<lettre::address::AddressError> for ChannelError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::Message(err.to_string())
    }
}

impl From<lettre::error::Error> for ChannelError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Message(err.to_string())
    }
}
