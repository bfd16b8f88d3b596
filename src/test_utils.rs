//! Test utilities and fixtures for discovery-sync tests.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{mock_track, files_in};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let dir = tempfile::tempdir().unwrap();
//!     let track = mock_track("Song", "Artist");
//!     // ... test logic
//!     assert_eq!(files_in(dir.path()), vec!["Artist Song.mp3"]);
//! }
//! ```

use std::path::Path;

use crate::model::{DEFAULT_SEPARATOR, Track};

/// Creates an unresolved track with the default separator and no album.
pub fn mock_track(title: &str, artist: &str) -> Track {
    Track::new(title, artist, "", "", DEFAULT_SEPARATOR)
}

/// Like [`mock_track`], with an album.
pub fn mock_track_on_album(title: &str, artist: &str, album: &str) -> Track {
    Track::new(title, artist, "", album, DEFAULT_SEPARATOR)
}

/// Sorted names of the entries directly inside `dir`.
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|e| {
            e.expect("Failed to read entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_track_defaults() {
        let track = mock_track("Song", "Artist");
        assert_eq!(track.file(), "Artist Song");
        assert_eq!(track.main_artist, "Artist");
        assert!(track.album.is_empty());
        assert!(!track.is_present());
    }

    #[test]
    fn test_files_in_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp3"), b"").unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"").unwrap();
        assert_eq!(files_in(dir.path()), vec!["a.mp3", "b.mp3"]);
    }
}
