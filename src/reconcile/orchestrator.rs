//! The sync run state machine.
//!
//! ```text
//! Start → LibraryResolved → TracksResolved → TracksAcquired → PlaylistReconciled → Done
//!               ↓
//!             Failed
//! ```

use super::report::{RunPhase, SyncReport};
use super::{SyncError, SyncOptions};
use crate::acquire::AcquisitionPipeline;
use crate::backend::MediaBackend;
use crate::model::{LibraryRef, PlaylistHandle, Track};

/// Drives one sync run against a backend
pub struct Orchestrator<'a> {
    backend: &'a dyn MediaBackend,
    pipeline: &'a AcquisitionPipeline,
    options: SyncOptions,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        backend: &'a dyn MediaBackend,
        pipeline: &'a AcquisitionPipeline,
        options: SyncOptions,
    ) -> Self {
        Self {
            backend,
            pipeline,
            options,
        }
    }

    /// Run the full sequence over `tracks`, in order.
    ///
    /// Tracks are updated in place with their backend IDs.
    pub async fn run(&self, tracks: &mut [Track]) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new();

        let library = match self.backend.resolve_library().await {
            Ok(library) => library,
            Err(e) => {
                self.advance(&mut report, RunPhase::Failed);
                return Err(SyncError::Library(e));
            }
        };
        tracing::info!("Using library '{}' on {}", library.name, self.backend.name());
        self.advance(&mut report, RunPhase::LibraryResolved);

        if !self.options.persist && !self.options.dry_run {
            self.tear_down().await;
        }

        report.present = self.resolve_tracks(tracks).await;
        self.advance(&mut report, RunPhase::TracksResolved);

        if self.options.dry_run {
            report.missing = tracks
                .iter()
                .filter(|t| !t.is_present())
                .map(|t| format!("{} - {}", t.artist, t.title))
                .collect();
            report.failed = report.missing.len();
            return Ok(report);
        }

        report.acquired = self.acquire(&library, tracks).await;
        self.advance(&mut report, RunPhase::TracksAcquired);

        report.track_ids = tracks
            .iter()
            .filter_map(|t| t.id().map(String::from))
            .collect();
        report.failed = tracks.len() - report.track_ids.len();

        let (playlist, created) = self.reconcile_playlist(&report.track_ids).await?;
        report.playlist = Some(playlist);
        report.created = created;
        self.advance(&mut report, RunPhase::PlaylistReconciled);

        if self.options.refresh_after_sync
            && let Err(e) = self.backend.refresh_library(&library).await
        {
            tracing::warn!("Final library refresh failed: {}", e);
        }
        self.advance(&mut report, RunPhase::Done);

        Ok(report)
    }

    fn advance(&self, report: &mut SyncReport, phase: RunPhase) {
        tracing::debug!("{} → {}", report.phase, phase);
        report.phase = phase;
    }

    /// Remove the previous run's playlist and downloads.
    async fn tear_down(&self) {
        let name = &self.options.playlist_name;
        match self.backend.find_playlist(name).await {
            Ok(Some(playlist)) => {
                tracing::info!("Deleting previous playlist '{}'", name);
                if let Err(e) = self.backend.delete_playlist(&playlist).await {
                    tracing::warn!("Failed to delete playlist '{}': {}", name, e);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to look up playlist '{}': {}", name, e),
        }

        if let Err(e) = self.pipeline.clear_download_dir().await {
            tracing::warn!("Failed to clear download dir: {}", e);
        }
    }

    /// Presence pass. Lookup errors count as not present.
    async fn resolve_tracks(&self, tracks: &mut [Track]) -> usize {
        let mut present = 0;
        for track in tracks.iter_mut() {
            match self.backend.find_existing_track(track).await {
                Ok(Some(id)) => {
                    tracing::debug!("'{}' already in library as {}", track.title, id);
                    track.mark_present(id);
                    present += 1;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Lookup for '{}' failed: {}", track.title, e),
            }
        }
        tracing::info!("{} of {} tracks already in library", present, tracks.len());
        present
    }

    /// Acquire missing tracks and pick up their IDs
    async fn acquire(&self, library: &LibraryRef, tracks: &mut [Track]) -> usize {
        let missing = tracks.iter().filter(|t| !t.is_present()).count();
        if missing == 0 {
            return 0;
        }

        tracing::info!("Acquiring {} tracks", missing);
        let acquisition = self
            .pipeline
            .acquire_all(tracks, self.options.single_item)
            .await;

        self.pipeline
            .assign_ids(
                self.backend,
                library,
                tracks,
                &acquisition.acquired,
                self.options.scan_wait,
            )
            .await
    }

    /// Update an existing playlist's description, or create it.
    async fn reconcile_playlist(
        &self,
        track_ids: &[String],
    ) -> Result<(PlaylistHandle, bool), SyncError> {
        let name = &self.options.playlist_name;
        let playlist_error = |source| SyncError::Playlist {
            name: name.clone(),
            source,
        };

        if let Some(existing) = self
            .backend
            .find_playlist(name)
            .await
            .map_err(playlist_error)?
        {
            tracing::info!("Playlist '{}' exists, updating description", name);
            self.backend
                .update_playlist_metadata(&existing, &self.options.description)
                .await
                .map_err(playlist_error)?;
            return Ok((existing, false));
        }

        tracing::info!("Creating playlist '{}' with {} tracks", name, track_ids.len());
        let playlist = self
            .backend
            .create_playlist(name, track_ids)
            .await
            .map_err(playlist_error)?;

        if let Err(e) = self
            .backend
            .update_playlist_metadata(&playlist, &self.options.description)
            .await
        {
            tracing::warn!("Failed to set playlist description: {}", e);
        }
        Ok((playlist, true))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use super::*;
    use crate::acquire::traits::mocks::{MockFetcher, MockSearch, MockTranscoder};
    use crate::acquire::Candidate;
    use crate::backend::traits::mocks::{Call, MockBackend};
    use crate::test_utils::{files_in, mock_track};

    const NAME: &str = "Discover-Weekly";

    fn options(persist: bool) -> SyncOptions {
        SyncOptions {
            playlist_name: NAME.to_string(),
            description: "Created for the week of 2026-10-18 using recommendations from test"
                .to_string(),
            persist,
            single_item: false,
            refresh_after_sync: false,
            scan_wait: Duration::ZERO,
            dry_run: false,
        }
    }

    /// Search finds one clean candidate per listed title; each has a payload.
    fn pipeline(dir: &Path, titles: &[&str]) -> AcquisitionPipeline {
        let mut search = MockSearch::new();
        let mut fetcher = MockFetcher::new();
        for title in titles {
            let id = format!("yt-{}", title);
            search = search.with_results(title, vec![Candidate::new(&id, *title, "Z - Topic")]);
            fetcher = fetcher.with_payload(&id, b"audio");
        }
        AcquisitionPipeline::new(
            Box::new(search),
            Box::new(fetcher),
            Box::new(MockTranscoder::new()),
            dir,
            vec!["remix".to_string()],
        )
    }

    fn tracks() -> Vec<Track> {
        vec![
            mock_track("A", "X"),
            mock_track("B", "Y"),
        ]
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_present_and_acquired_tracks_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new()
            .with_track("A", "101")
            .with_pending("B", "202");
        let pipeline = pipeline(dir.path(), &["A", "B"]);
        let mut tracks = tracks();

        let report = Orchestrator::new(&backend, &pipeline, options(true))
            .run(&mut tracks)
            .await
            .unwrap();

        assert_eq!(backend.playlist_tracks(NAME), Some(ids(&["101", "202"])));
        assert_eq!(report.track_ids, ids(&["101", "202"]));
        assert_eq!(report.phase, RunPhase::Done);
        assert!(report.created);
        assert_eq!((report.present, report.acquired, report.failed), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_present_tracks_are_never_acquired() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new()
            .with_track("A", "101")
            .with_pending("B", "202");
        let pipeline = pipeline(dir.path(), &["A", "B"]);

        Orchestrator::new(&backend, &pipeline, options(true))
            .run(&mut tracks())
            .await
            .unwrap();

        assert_eq!(files_in(dir.path()), vec!["Y B.mp3"]);
    }

    #[tokio::test]
    async fn test_non_persistent_rerun_replaces_playlist_and_downloads() {
        let dir = tempfile::tempdir().unwrap();

        let first = MockBackend::new()
            .with_track("A", "101")
            .with_pending("B", "202");
        let pipeline = pipeline(dir.path(), &["A", "B"]);
        Orchestrator::new(&first, &pipeline, options(false))
            .run(&mut tracks())
            .await
            .unwrap();
        let first_tracks = first.playlist_tracks(NAME).unwrap();

        // Same server state on the second run, plus the first run's leftovers
        std::fs::write(dir.path().join("stale.mp3"), b"old").unwrap();
        let second = MockBackend::new()
            .with_track("A", "101")
            .with_pending("B", "202")
            .with_playlist(NAME, "pl-old", &["101", "202"]);
        let report = Orchestrator::new(&second, &pipeline, options(false))
            .run(&mut tracks())
            .await
            .unwrap();

        assert_eq!(second.playlist_tracks(NAME), Some(first_tracks));
        assert!(second.calls().contains(&Call::DeletePlaylist("pl-old".to_string())));
        assert!(report.created);
        assert_eq!(files_in(dir.path()), vec!["Y B.mp3"]);
    }

    #[tokio::test]
    async fn test_teardown_happens_before_acquisition() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new()
            .with_pending("B", "202")
            .with_playlist(NAME, "pl-old", &[]);
        let pipeline = pipeline(dir.path(), &["B"]);

        Orchestrator::new(&backend, &pipeline, options(false))
            .run(&mut tracks())
            .await
            .unwrap();

        let calls = backend.calls();
        let delete = calls
            .iter()
            .position(|c| *c == Call::DeletePlaylist("pl-old".to_string()))
            .unwrap();
        let refresh = calls.iter().position(|c| *c == Call::Refresh).unwrap();
        assert!(delete < refresh);
    }

    #[tokio::test]
    async fn test_track_without_candidates_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new()
            .with_track("A", "101")
            .with_pending("C", "303");
        let pipeline = pipeline(dir.path(), &["C"]);
        let mut tracks = vec![
            mock_track("A", "X"),
            mock_track("B", "Y"),
            mock_track("C", "Z"),
        ];

        let report = Orchestrator::new(&backend, &pipeline, options(true))
            .run(&mut tracks)
            .await
            .unwrap();

        assert_eq!(report.phase, RunPhase::Done);
        assert_eq!(report.failed, 1);
        assert_eq!(backend.playlist_tracks(NAME), Some(ids(&["101", "303"])));
    }

    #[tokio::test]
    async fn test_library_failure_is_fatal_and_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep.mp3"), b"x").unwrap();
        let backend = MockBackend::new()
            .with_library_error("Explo")
            .with_playlist(NAME, "pl-1", &["1"]);
        let pipeline = pipeline(dir.path(), &["A", "B"]);

        let result = Orchestrator::new(&backend, &pipeline, options(false))
            .run(&mut tracks())
            .await;

        assert!(matches!(result, Err(SyncError::Library(_))));
        assert_eq!(backend.calls(), vec![Call::ResolveLibrary]);
        assert_eq!(files_in(dir.path()), vec!["keep.mp3"]);
        assert_eq!(backend.playlist_tracks(NAME), Some(ids(&["1"])));
    }

    #[tokio::test]
    async fn test_persistent_existing_playlist_only_gets_description() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new()
            .with_track("A", "101")
            .with_track("B", "202")
            .with_playlist(NAME, "pl-9", &["101"]);
        let pipeline = pipeline(dir.path(), &[]);

        let report = Orchestrator::new(&backend, &pipeline, options(true))
            .run(&mut tracks())
            .await
            .unwrap();

        assert!(!report.created);
        assert_eq!(report.playlist.unwrap().id, "pl-9");
        assert_eq!(backend.playlist_tracks(NAME), Some(ids(&["101"])));
        assert!(
            backend
                .description("pl-9")
                .unwrap()
                .starts_with("Created for the week of")
        );
        assert!(
            !backend
                .calls()
                .iter()
                .any(|c| matches!(c, Call::CreatePlaylist(..)))
        );
    }

    #[tokio::test]
    async fn test_rejected_ids_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = MockBackend::new()
            .with_track("A", "101")
            .with_track("B", "202");
        backend.rejected_ids = ids(&["101"]);
        let pipeline = pipeline(dir.path(), &[]);

        let report = Orchestrator::new(&backend, &pipeline, options(true))
            .run(&mut tracks())
            .await
            .unwrap();

        assert_eq!(report.track_ids, ids(&["101", "202"]));
        assert_eq!(backend.playlist_tracks(NAME), Some(ids(&["202"])));
    }

    #[tokio::test]
    async fn test_lookup_error_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = MockBackend::new().with_pending("A", "101");
        backend.failing_lookups = vec!["B".to_string()];
        let pipeline = pipeline(dir.path(), &["A", "B"]);

        let report = Orchestrator::new(&backend, &pipeline, options(true))
            .run(&mut tracks())
            .await
            .unwrap();

        // B was still downloaded, but never resolves to an ID
        assert_eq!(files_in(dir.path()), vec!["X A.mp3", "Y B.mp3"]);
        assert_eq!(report.track_ids, ids(&["101"]));
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_dry_run_stops_after_presence_pass() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new().with_track("A", "101");
        let pipeline = pipeline(dir.path(), &["B"]);
        let mut opts = options(false);
        opts.dry_run = true;

        let report = Orchestrator::new(&backend, &pipeline, opts)
            .run(&mut tracks())
            .await
            .unwrap();

        assert_eq!(report.phase, RunPhase::TracksResolved);
        assert_eq!(report.missing, vec!["Y - B"]);
        assert!(report.playlist.is_none());
        assert!(files_in(dir.path()).is_empty());
        assert_eq!(
            backend.calls(),
            vec![
                Call::ResolveLibrary,
                Call::FindTrack("A".to_string()),
                Call::FindTrack("B".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_refresh_after_sync() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new().with_track("A", "101").with_track("B", "202");
        let pipeline = pipeline(dir.path(), &[]);
        let mut opts = options(true);
        opts.refresh_after_sync = true;

        Orchestrator::new(&backend, &pipeline, opts)
            .run(&mut tracks())
            .await
            .unwrap();

        assert_eq!(backend.calls().last(), Some(&Call::Refresh));
        assert!(!backend.calls()[..backend.calls().len() - 1].contains(&Call::Refresh));
    }

    #[tokio::test]
    async fn test_single_item_mode() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new()
            .with_pending("A", "101")
            .with_pending("B", "202");
        let pipeline = pipeline(dir.path(), &["A", "B"]);
        let mut opts = options(true);
        opts.single_item = true;

        let report = Orchestrator::new(&backend, &pipeline, opts)
            .run(&mut tracks())
            .await
            .unwrap();

        assert_eq!(files_in(dir.path()), vec!["X A.mp3"]);
        assert_eq!(report.track_ids, ids(&["101"]));
    }
}
