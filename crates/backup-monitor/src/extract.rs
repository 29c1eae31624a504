//! Typed view over raw Velero `Backup` objects.
//!
//! Backups arrive as untyped JSON (see [`crate::source`]). Only a missing
//! name or phase makes a record unusable; every other field falls back to a
//! sentinel (`"Unknown"` or `0`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Placeholder for absent timestamps and progress counters.
pub const UNKNOWN: &str = "Unknown";

/// Human-readable timestamp layout used in reports.
const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Lifecycle phase of a backup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Phase {
    Unknown,
    New,
    InProgress,
    Completed,
    Failed,
    PartiallyFailed,
    FinalizingPartiallyFailed,
    /// Any phase this monitor has no special handling for
    Other(String),
}

impl Phase {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Unknown" => Self::Unknown,
            "New" => Self::New,
            "InProgress" => Self::InProgress,
            "Completed" => Self::Completed,
            "Failed" => Self::Failed,
            "PartiallyFailed" => Self::PartiallyFailed,
            "FinalizingPartiallyFailed" => Self::FinalizingPartiallyFailed,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown => "Unknown",
            Self::New => "New",
            Self::InProgress => "InProgress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::PartiallyFailed => "PartiallyFailed",
            Self::FinalizingPartiallyFailed => "FinalizingPartiallyFailed",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of one backup as seen in a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub name: String,
    pub phase: Phase,
    /// Display-formatted start time, or `"Unknown"`
    pub start_time: String,
    /// Display-formatted completion time, or `"Unknown"`
    pub completion_time: String,
    pub items_backed_up: String,
    pub total_items: String,
    pub warnings: u64,
    pub errors: u64,
    pub failure_reason: Option<String>,
}

/// A raw object that cannot be tracked.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Backup {name} is not supported: {reason}")]
pub struct UnsupportedRecord {
    /// Name if one could be read, otherwise empty
    pub name: String,
    pub reason: &'static str,
}

/// Extract a [`BackupRecord`] from a raw `Backup` object.
pub fn extract(raw: &Value) -> Result<BackupRecord, UnsupportedRecord> {
    let name = raw
        .pointer("/metadata/name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| UnsupportedRecord {
            name: String::new(),
            reason: "missing metadata.name",
        })?
        .to_string();

    let phase = match raw.pointer("/status/phase") {
        Some(Value::String(phase)) => Phase::parse(phase),
        Some(_) => {
            return Err(UnsupportedRecord {
                name,
                reason: "status.phase is not a string",
            })
        }
        None => {
            return Err(UnsupportedRecord {
                name,
                reason: "missing status.phase",
            })
        }
    };

    let status = raw.get("status");
    let field = |key: &str| status.and_then(|s| s.get(key));

    let (items_backed_up, total_items) = match field("progress") {
        Some(Value::Object(progress)) => (
            display_value(progress.get("itemsBackedUp")),
            display_value(progress.get("totalItems")),
        ),
        _ => (UNKNOWN.to_string(), UNKNOWN.to_string()),
    };

    Ok(BackupRecord {
        name,
        phase,
        start_time: display_timestamp(field("startTimestamp")),
        completion_time: display_timestamp(field("completionTimestamp")),
        items_backed_up,
        total_items,
        warnings: normalize_count(field("warnings")),
        errors: normalize_count(field("errors")),
        failure_reason: field("failureReason")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
    })
}

/// Normalize an integer, float, or numeric string to a non-negative count.
///
/// Anything unparseable (or negative) becomes 0.
#[must_use]
pub fn normalize_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|i| u64::try_from(i).unwrap_or(0)))
            .or_else(|| n.as_f64().map(float_count))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(|i| u64::try_from(i).unwrap_or(0))
                .or_else(|_| s.parse::<f64>().map(float_count))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn float_count(f: f64) -> u64 {
    if f.is_finite() && f > 0.0 {
        f.trunc() as u64
    } else {
        0
    }
}

/// Render a progress counter as an opaque display string.
fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => UNKNOWN.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Reformat an RFC 3339 timestamp for display, passing unparseable input through.
fn display_timestamp(value: Option<&Value>) -> String {
    match value.and_then(Value::as_str) {
        Some(raw) => format_timestamp(raw),
        None => UNKNOWN.to_string(),
    }
}

#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |ts| {
            ts.with_timezone(&Utc)
                .format(DISPLAY_TIME_FORMAT)
                .to_string()
        },
    )
}
