//! Notification message and severity types.

use std::fmt;

/// Severity label derived from a notification's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Backup finished cleanly
    Completed,
    /// Backup failed, or the backups could not be listed at all
    Failed,
    /// Backup finished with some items failing
    PartiallyFailed,
    /// Backup is finalizing after a partial failure
    FinalizingPartiallyFailed,
    /// Nothing recognizable in the message
    Unknown,
}

impl Severity {
    /// Hex color used when rendering this severity (Slack attachment bar).
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Completed => "#36A64F",                 // Green
            Self::Failed => "#8B0000",                    // Dark red
            Self::PartiallyFailed => "#FFA500",           // Orange
            Self::FinalizingPartiallyFailed => "#FFF000", // Yellow
            Self::Unknown => "#FF0000",                   // Red
        }
    }

    /// Display label for this severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::PartiallyFailed => "Partially Failed",
            Self::FinalizingPartiallyFailed => "Finalizing Partially Failed",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether a failures-only channel should receive messages of this severity.
    ///
    /// Anything that is not a clean completion counts, including `Unknown`.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully composed notification.
///
/// Created once, handed to the [`Notifier`](crate::Notifier) by value and never
/// mutated afterwards; channels only ever see a prefixed copy of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    text: String,
}

impl Notification {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The composed text, without any channel prefix.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
