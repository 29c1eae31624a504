//! Report text for backup transitions and listing failures.
//!
//! The phrases "completed successfully", "finished with status: <phase>" and
//! "Failed to retrieve backups" are what [`notify::classify`] keys on.

use std::fmt::Write as _;

use notify::Notification;

use crate::extract::{BackupRecord, Phase};
use crate::tracker::TransitionDecision;

/// Compose the report for a record whose tracker decision is a transition.
///
/// Returns `None` for every other decision.
#[must_use]
pub fn compose(record: &BackupRecord, decision: &TransitionDecision) -> Option<Notification> {
    if !decision.should_notify() {
        return None;
    }

    let mut message = if record.phase == Phase::Completed {
        format!("Backup {} completed successfully.", record.name)
    } else {
        format!(
            "Backup {} finished with status: {}.",
            record.name, record.phase
        )
    };

    let _ = write!(
        message,
        "\nStart Time: {}, End Time: {}.\nProgress: {}/{} items processed",
        record.start_time, record.completion_time, record.items_backed_up, record.total_items
    );

    if record.phase == Phase::Failed {
        if let Some(reason) = &record.failure_reason {
            let _ = write!(message, "\nFailure Reason: {reason}");
        }
    }

    if record.warnings > 0 {
        let _ = write!(message, " (with {} warnings).", record.warnings);
    }
    if record.errors > 0 {
        let _ = write!(message, " (with {} errors).", record.errors);
    }

    Some(Notification::new(message))
}

/// Compose the report sent when backups cannot be listed at all.
#[must_use]
pub fn listing_failure(source: &str, error: &anyhow::Error) -> Notification {
    Notification::new(format!(
        "Failed to retrieve backups from {source}: {error:#}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::{classify, Severity};

    fn record(phase: Phase) -> BackupRecord {
        BackupRecord {
            name: "nightly-01".to_string(),
            phase,
            start_time: "2024-03-01 02:00 UTC".to_string(),
            completion_time: "2024-03-01 02:14 UTC".to_string(),
            items_backed_up: "120".to_string(),
            total_items: "120".to_string(),
            warnings: 0,
            errors: 0,
            failure_reason: None,
        }
    }

    fn transitioned() -> TransitionDecision {
        TransitionDecision::Transitioned {
            previous: Phase::InProgress,
        }
    }

    #[test]
    fn test_completed_report() {
        let mut rec = record(Phase::Completed);
        rec.warnings = 3;

        let message = compose(&rec, &transitioned()).unwrap();
        let text = message.text();

        assert!(text.contains("Backup nightly-01 completed successfully."));
        assert!(text.contains("Start Time: 2024-03-01 02:00 UTC, End Time: 2024-03-01 02:14 UTC."));
        assert!(text.contains("120/120 items processed"));
        assert!(text.ends_with(" (with 3 warnings)."));
        assert!(!text.contains("errors)"));
        assert_eq!(classify(text), Severity::Completed);
    }

    #[test]
    fn test_failed_report_includes_reason() {
        let mut rec = record(Phase::Failed);
        rec.failure_reason = Some("object store unreachable".to_string());
        rec.errors = 2;

        let text = compose(&rec, &transitioned()).unwrap().to_string();
        assert_eq!(
            text,
            "Backup nightly-01 finished with status: Failed.\n\
             Start Time: 2024-03-01 02:00 UTC, End Time: 2024-03-01 02:14 UTC.\n\
             Progress: 120/120 items processed\n\
             Failure Reason: object store unreachable (with 2 errors)."
        );
        assert_eq!(classify(&text), Severity::Failed);
    }

    #[test]
    fn test_reason_only_for_failed_phase() {
        let mut rec = record(Phase::PartiallyFailed);
        rec.failure_reason = Some("ignored".to_string());

        let text = compose(&rec, &transitioned()).unwrap().to_string();
        assert!(text.contains("finished with status: PartiallyFailed."));
        assert!(!text.contains("Failure Reason"));
        assert_eq!(classify(&text), Severity::PartiallyFailed);
    }

    #[test]
    fn test_warnings_and_errors_both_appended() {
        let mut rec = record(Phase::PartiallyFailed);
        rec.warnings = 1;
        rec.errors = 4;

        let text = compose(&rec, &transitioned()).unwrap().to_string();
        assert!(text.ends_with(" (with 1 warnings). (with 4 errors)."));
    }

    #[test]
    fn test_no_report_without_transition() {
        let rec = record(Phase::Completed);
        for decision in [
            TransitionDecision::Ignore,
            TransitionDecision::FirstSeenInProgress,
            TransitionDecision::StillInProgress,
            TransitionDecision::Unchanged,
        ] {
            assert!(compose(&rec, &decision).is_none());
        }
    }

    #[test]
    fn test_listing_failure() {
        let err = anyhow::anyhow!("connection refused");
        let message = listing_failure("Velero", &err);
        assert_eq!(
            message.text(),
            "Failed to retrieve backups from Velero: connection refused"
        );
        assert_eq!(classify(message.text()), Severity::Failed);
    }
}
