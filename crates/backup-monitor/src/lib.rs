//! Velero backup monitor.
//!
//! Polls Velero `Backup` resources, remembers which backups were seen
//! running, and reports each one exactly once when it leaves `InProgress`.
//!
//! - [`source`] lists raw backup objects ([`source::KubeBackupSource`] for a live cluster)
//! - [`extract`] turns a raw object into a [`extract::BackupRecord`]
//! - [`tracker`] decides whether a phase change is worth reporting
//! - [`compose`] writes the report text
//! - [`poller`] runs the cycle and hands reports to a [`notify::Notifier`]

pub mod compose;
pub mod config;
pub mod extract;
pub mod poller;
pub mod source;
pub mod tracker;

pub use config::Config;
pub use extract::{BackupRecord, Phase};
pub use poller::{BackupPoller, CycleReport};
pub use source::{BackupSource, KubeBackupSource};
pub use tracker::{BackupTracker, TransitionDecision};
