//! Reconciliation: one sync run from recommendations to playlist.
//!
//! The [`Orchestrator`] holds only a `dyn MediaBackend` and never branches on
//! which server it talks to. It decides what is fatal (library resolution,
//! writing the playlist) and what is skipped per track (everything else).

mod orchestrator;
mod report;

use chrono::NaiveDate;
use std::time::Duration;

use crate::backend::BackendError;
use crate::config::{Config, Discovery};

pub use orchestrator::Orchestrator;
pub use report::{RunPhase, SyncReport};

/// Errors that end a run
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Could not resolve the target library: {0}")]
    Library(BackendError),

    #[error("Could not write playlist '{name}': {source}")]
    Playlist { name: String, source: BackendError },
}

/// Settings for one run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub playlist_name: String,
    pub description: String,
    /// Keep the previous run's playlist and downloads
    pub persist: bool,
    /// Stop acquiring after the first success
    pub single_item: bool,
    pub refresh_after_sync: bool,
    /// How long to give the backend to index new downloads
    pub scan_wait: Duration,
    /// Stop after the presence pass
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn from_config(config: &Config, today: NaiveDate, source_label: &str) -> Self {
        Self {
            playlist_name: config.playlist_name(today),
            description: describe(today, source_label),
            persist: config.playlist.persist,
            single_item: config.listenbrainz.discovery == Discovery::Test,
            refresh_after_sync: config.playlist.refresh_after_sync,
            scan_wait: Duration::from_secs(config.playlist.scan_wait_secs),
            dry_run: false,
        }
    }
}

/// Playlist description for a run on `today`
pub fn describe(today: NaiveDate, source_label: &str) -> String {
    format!(
        "Created for the week of {} using recommendations from {}",
        today.format("%Y-%m-%d"),
        source_label
    )
}
