//! Text-based severity classification.
//!
//! Classification runs on the final, prefixed message text so that synthetic
//! messages (listing failures, transport errors) which carry no structured
//! phase are labelled the same way as composed backup reports. The phrases
//! matched here are the ones produced by the backup monitor's composer and
//! must stay in sync with it.

use regex::Regex;
use std::sync::LazyLock;

use crate::events::Severity;

/// Phrases that mark a hard failure, checked before anything else.
static FAILURE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(error|failed to) retriev\w*\s+backups").unwrap(),
        Regex::new(r"connection reset by peer").unwrap(),
        Regex::new(r"finished with status:\s*failed").unwrap(),
    ]
});

const COMPLETED_PHRASE: &str = "completed successfully";
const PARTIALLY_FAILED_PHRASE: &str = "finished with status: partiallyfailed";
const FINALIZING_PHRASE: &str = "finished with status: finalizingpartiallyfailed";

/// Derive a severity from free-form message text.
///
/// Priority order: failure phrases, clean completion, partial failure,
/// finalizing partial failure, then `Unknown`.
#[must_use]
pub fn classify(message: &str) -> Severity {
    let text = message.to_lowercase();

    if FAILURE_PATTERNS.iter().any(|re| re.is_match(&text)) {
        Severity::Failed
    } else if text.contains(COMPLETED_PHRASE) {
        Severity::Completed
    } else if text.contains(PARTIALLY_FAILED_PHRASE) {
        Severity::PartiallyFailed
    } else if text.contains(FINALIZING_PHRASE) {
        Severity::FinalizingPartiallyFailed
    } else {
        Severity::Unknown
    }
}
