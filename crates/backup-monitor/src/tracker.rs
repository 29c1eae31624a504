//! In-memory record of the last phase seen for each backup.

use std::collections::HashMap;

use crate::extract::Phase;

/// What a new observation means for notification purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionDecision {
    /// Unknown backup seen in a non-running phase; never tracked.
    Ignore,
    /// Unknown backup seen running; now tracked.
    FirstSeenInProgress,
    /// Backup left `InProgress`; the only decision that produces a report.
    Transitioned { previous: Phase },
    /// Backup is still running.
    StillInProgress,
    /// Backup was already terminal; nothing to report.
    Unchanged,
}

impl TransitionDecision {
    #[must_use]
    pub const fn should_notify(&self) -> bool {
        matches!(self, Self::Transitioned { .. })
    }
}

/// Maps backup names to their last observed phase.
///
/// Entries are only created for backups first seen `InProgress` and are kept
/// for the life of the process. One tracker belongs to one poll loop.
#[derive(Debug, Default)]
pub struct BackupTracker {
    phases: HashMap<String, Phase>,
}

impl BackupTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `phase` for `name` and decide whether a report is due.
    pub fn observe(&mut self, name: &str, phase: &Phase) -> TransitionDecision {
        let Some(stored) = self.phases.get_mut(name) else {
            if phase.is_in_progress() {
                self.phases.insert(name.to_string(), phase.clone());
                return TransitionDecision::FirstSeenInProgress;
            }
            return TransitionDecision::Ignore;
        };

        match (stored.is_in_progress(), phase.is_in_progress()) {
            (true, true) => TransitionDecision::StillInProgress,
            (true, false) => {
                let previous = std::mem::replace(stored, phase.clone());
                TransitionDecision::Transitioned { previous }
            }
            // Terminal phases are overwritten silently, including flaps
            // between two different terminal phases.
            (false, _) => {
                *stored = phase.clone();
                TransitionDecision::Unchanged
            }
        }
    }

    /// Last phase recorded for `name`.
    #[must_use]
    pub fn phase_of(&self, name: &str) -> Option<&Phase> {
        self.phases.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}
