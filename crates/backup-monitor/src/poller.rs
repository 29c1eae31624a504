//! The polling loop that ties extraction, tracking, composition and dispatch together.

use std::time::Duration;

use notify::Notifier;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::compose::{compose, listing_failure};
use crate::extract::extract;
use crate::source::BackupSource;
use crate::tracker::{BackupTracker, TransitionDecision};

/// Summary of one poll cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Records returned by the listing call
    pub listed: usize,
    /// Records skipped as unsupported
    pub skipped: usize,
    /// Notifications handed to the notifier
    pub notified: usize,
    /// The listing call itself failed
    pub listing_failed: bool,
}

/// Polls a [`BackupSource`] on a fixed interval and reports transitions.
pub struct BackupPoller<S> {
    source: S,
    tracker: BackupTracker,
    notifier: Notifier,
    interval: Duration,
    verbose: bool,
}

impl<S: BackupSource> BackupPoller<S> {
    #[must_use]
    pub fn new(source: S, notifier: Notifier, interval: Duration) -> Self {
        Self {
            source,
            tracker: BackupTracker::new(),
            notifier,
            interval,
            verbose: false,
        }
    }

    /// Log per-cycle counts and still-running backups.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub const fn tracker(&self) -> &BackupTracker {
        &self.tracker
    }

    /// Poll until `cancel` fires.
    ///
    /// The first poll happens one interval after start. Cancellation is
    /// checked at each tick and between records of an in-flight cycle.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            namespace = self.source.namespace(),
            interval_secs = self.interval.as_secs(),
            channels = self.notifier.channel_count(),
            "Watching backups"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("Shutting down backup monitor");
                    return;
                }
                _ = ticker.tick() => {
                    self.poll_cycle(&cancel).await;
                }
            }
        }
    }

    /// Run a single poll cycle.
    pub async fn poll_once(&mut self) -> CycleReport {
        self.poll_cycle(&CancellationToken::new()).await
    }

    async fn poll_cycle(&mut self, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();

        let items = match self.source.list().await {
            Ok(items) => items,
            Err(e) => {
                error!(
                    source = self.source.describe(),
                    error = %e,
                    "Error retrieving backups"
                );
                report.listing_failed = true;
                let message = listing_failure(self.source.describe(), &e);
                self.notifier.dispatch(message).await;
                report.notified = 1;
                return report;
            }
        };

        report.listed = items.len();
        if self.verbose {
            info!(
                count = items.len(),
                namespace = self.source.namespace(),
                "Found backups"
            );
        }

        for raw in &items {
            if cancel.is_cancelled() {
                debug!("Cancellation requested, stopping cycle early");
                break;
            }

            let record = match extract(raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!(backup = %e.name, reason = e.reason, "Backup is not supported");
                    report.skipped += 1;
                    continue;
                }
            };

            let decision = self.tracker.observe(&record.name, &record.phase);
            match decision {
                TransitionDecision::FirstSeenInProgress => {
                    info!(backup = %record.name, "New backup detected in progress");
                }
                TransitionDecision::StillInProgress if self.verbose => {
                    info!(backup = %record.name, "Backup is still in progress");
                }
                _ => {}
            }

            if let Some(message) = compose(&record, &decision) {
                info!(
                    backup = %record.name,
                    phase = %record.phase,
                    message = %message,
                    "Backup finished"
                );
                self.notifier.dispatch(message).await;
                report.notified += 1;
            }
        }

        report
    }
}
