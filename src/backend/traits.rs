//! The capability contract every media backend implements.
//!
//! The orchestrator only ever holds a `dyn MediaBackend`; which server family
//! sits behind it is decided once in [`super::connect`].
//!
//! The `mocks` module provides an in-memory implementation for tests.

use async_trait::async_trait;

use super::BackendError;
use crate::model::{LibraryRef, PlaylistHandle, Track};

/// Operations the sync flow needs from a media server.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Short backend name for logs ("jellyfin", "plex", ...)
    fn name(&self) -> &'static str;

    /// Locate (or, where supported, create) the target library.
    ///
    /// Idempotent: once resolved, the same ref is returned for the rest of the run.
    /// Any error here is fatal for the run.
    async fn resolve_library(&self) -> Result<LibraryRef, BackendError>;

    /// Look up a track in the backend catalog.
    ///
    /// `Ok(None)` is the normal not-found outcome. A returned ID always refers to
    /// the same (title, artist/album) identity as `track`.
    async fn find_existing_track(&self, track: &Track) -> Result<Option<String>, BackendError>;

    /// Find the playlist with exactly this name.
    async fn find_playlist(&self, name: &str) -> Result<Option<PlaylistHandle>, BackendError>;

    /// Create a playlist with `track_ids` in order.
    ///
    /// IDs the backend rejects are logged and skipped.
    async fn create_playlist(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<PlaylistHandle, BackendError>;

    /// Set the playlist description, re-sending whatever else the backend requires.
    async fn update_playlist_metadata(
        &self,
        playlist: &PlaylistHandle,
        description: &str,
    ) -> Result<(), BackendError>;

    /// Delete a playlist. A playlist that no longer exists is not an error.
    async fn delete_playlist(&self, playlist: &PlaylistHandle) -> Result<(), BackendError>;

    /// Ask the backend to rescan the library. Does not wait for the scan.
    async fn refresh_library(&self, library: &LibraryRef) -> Result<(), BackendError>;

    /// Whether newly written files only show up after a library scan.
    fn indexes_asynchronously(&self) -> bool {
        true
    }
}
