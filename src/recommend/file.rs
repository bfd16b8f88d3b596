//! Track list from a local JSON file.
//!
//! ```json
//! [
//!   {"title": "Song", "artist": "Artist feat. Guest", "album": "Album", "main_artist": "Artist"}
//! ]
//! ```
//!
//! `album` and `main_artist` are optional.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use super::{RecommendError, RecommendationSource};
use crate::model::Track;

#[derive(Debug, Deserialize)]
struct Entry {
    title: String,
    artist: String,
    #[serde(default)]
    album: String,
    #[serde(default)]
    main_artist: String,
}

/// Reads tracks from a JSON file
pub struct FileSource {
    path: PathBuf,
    separator: String,
    label: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, separator: impl Into<String>) -> Self {
        let path = path.into();
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            separator: separator.into(),
            label,
        }
    }
}

fn parse(contents: &str, separator: &str) -> Result<Vec<Track>, RecommendError> {
    let entries: Vec<Entry> =
        serde_json::from_str(contents).map_err(|e| RecommendError::Invalid(e.to_string()))?;

    Ok(entries
        .into_iter()
        .filter(|e| !e.title.trim().is_empty() && !e.artist.trim().is_empty())
        .map(|e| Track::new(e.title, e.artist, e.main_artist, e.album, separator))
        .collect())
}

#[async_trait]
impl RecommendationSource for FileSource {
    async fn fetch_tracks(&self) -> Result<Vec<Track>, RecommendError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let tracks = parse(&contents, &self.separator)?;
        tracing::info!("Read {} tracks from {:?}", tracks.len(), self.path);
        Ok(tracks)
    }

    fn label(&self) -> &str {
        &self.label
    }
}
