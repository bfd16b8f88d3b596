//! Run phases and the end-of-run report.

use std::fmt;

use crate::model::PlaylistHandle;

/// Where a sync run is. Phases only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Start,
    LibraryResolved,
    TracksResolved,
    TracksAcquired,
    PlaylistReconciled,
    Done,
    /// The library could not be resolved; nothing was changed
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::LibraryResolved => "library resolved",
            Self::TracksResolved => "tracks resolved",
            Self::TracksAcquired => "tracks acquired",
            Self::PlaylistReconciled => "playlist reconciled",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The reconciled playlist (none for a dry run)
    pub playlist: Option<PlaylistHandle>,
    /// Whether the playlist was created (vs. an existing one updated)
    pub created: bool,
    /// Tracks already in the library before acquisition
    pub present: usize,
    /// Tracks downloaded and found in the library afterwards
    pub acquired: usize,
    /// Tracks that ended up without an ID
    pub failed: usize,
    /// IDs submitted to the playlist, in order
    pub track_ids: Vec<String>,
    /// Titles not present in the library (dry run only)
    pub missing: Vec<String>,
    pub phase: RunPhase,
}

impl SyncReport {
    pub(super) fn new() -> Self {
        Self {
            playlist: None,
            created: false,
            present: 0,
            acquired: 0,
            failed: 0,
            track_ids: Vec::new(),
            missing: Vec::new(),
            phase: RunPhase::Start,
        }
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.playlist {
            Some(ref playlist) => writeln!(
                f,
                "Playlist '{}' {} with {} tracks",
                playlist.name,
                if self.created { "created" } else { "updated" },
                self.track_ids.len()
            )?,
            None => writeln!(f, "Dry run, stopped at: {}", self.phase)?,
        }
        writeln!(f, "  Already present: {}", self.present)?;
        writeln!(f, "  Acquired:        {}", self.acquired)?;
        write!(f, "  Failed:          {}", self.failed)?;
        for title in &self.missing {
            write!(f, "\n  would acquire:   {}", title)?;
        }
        Ok(())
    }
}
