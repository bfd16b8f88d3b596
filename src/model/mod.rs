//! Core data models for a sync run.
//!
//! Defines the primary entities: [`Track`], [`LibraryRef`], and [`PlaylistHandle`].
//! None of these are persisted; they live for the duration of one run.

/// Default separator placed between artist and title in derived file names.
pub const DEFAULT_SEPARATOR: &str = " ";

/// A recommended song to place in the playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Track title as recommended
    pub title: String,
    /// Full artist credit
    pub artist: String,
    /// First credited artist (used for channel matching)
    pub main_artist: String,
    /// Album title (may be empty)
    pub album: String,
    /// Filesystem-safe base name, derived from artist + separator + title
    file: String,
    /// Backend-native ID, once resolved or acquired
    id: Option<String>,
    /// Whether the track exists in (or was added to) the backend library
    present: bool,
}

impl Track {
    /// Create an unresolved track.
    ///
    /// An empty `main_artist` falls back to `artist`.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        main_artist: impl Into<String>,
        album: impl Into<String>,
        separator: &str,
    ) -> Self {
        let title = title.into();
        let artist = artist.into();
        let mut main_artist = main_artist.into();
        if main_artist.is_empty() {
            main_artist = artist.clone();
        }
        let file = derive_file_name(&artist, &title, separator);

        Self {
            title,
            artist,
            main_artist,
            album: album.into(),
            file,
            id: None,
            present: false,
        }
    }

    /// Filesystem-safe base name (no extension).
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Backend-native ID, if resolved.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Record the backend ID and mark the track present.
    ///
    /// The first assignment wins; a second one is ignored and logged, since an ID
    /// comes either from the presence pass or from acquisition but never both.
    pub fn mark_present(&mut self, id: impl Into<String>) {
        let id = id.into();
        if id.is_empty() {
            return;
        }
        if let Some(existing) = &self.id {
            tracing::debug!(
                "Ignoring second ID {} for '{}' (already {})",
                id,
                self.title,
                existing
            );
            return;
        }
        self.id = Some(id);
        self.present = true;
    }
}

/// Derive the on-disk base name for a track.
pub fn derive_file_name(artist: &str, title: &str, separator: &str) -> String {
    sanitize_filename(&format!("{}{}{}", artist, separator, title))
}

/// Replace characters that are invalid in file names on common platforms.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

/// The target music collection on a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRef {
    /// Human-readable library name
    pub name: String,
    /// Backend-native ID (folder ID, section key, or directory path)
    pub id: String,
}

/// A playlist on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistHandle {
    /// Backend-native playlist ID
    pub id: String,
    /// Playlist name
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_uses_separator() {
        let track = Track::new("Song", "Artist", "", "Album", " - ");
        assert_eq!(track.file(), "Artist - Song");
    }

    #[test]
    fn test_file_name_sanitized() {
        let track = Track::new("What/Why?", "AC/DC", "", "", DEFAULT_SEPARATOR);
        assert_eq!(track.file(), "AC_DC What_Why_");
    }

    #[test]
    fn test_main_artist_falls_back_to_artist() {
        let track = Track::new("Song", "Artist feat. Other", "", "", DEFAULT_SEPARATOR);
        assert_eq!(track.main_artist, "Artist feat. Other");

        let track = Track::new("Song", "Artist feat. Other", "Artist", "", DEFAULT_SEPARATOR);
        assert_eq!(track.main_artist, "Artist");
    }

    #[test]
    fn test_mark_present_sets_id_once() {
        let mut track = Track::new("Song", "Artist", "", "", DEFAULT_SEPARATOR);
        assert!(!track.is_present());
        assert_eq!(track.id(), None);

        track.mark_present("101");
        track.mark_present("202");

        assert!(track.is_present());
        assert_eq!(track.id(), Some("101"));
    }

    #[test]
    fn test_mark_present_ignores_empty_id() {
        let mut track = Track::new("Song", "Artist", "", "", DEFAULT_SEPARATOR);
        track.mark_present("");
        assert!(!track.is_present());
    }
}
