//! Subsonic API Data Transfer Objects
//!
//! Every response is wrapped in a `subsonic-response` envelope carrying a status
//! and, on failure, an error object. The payload fields sit next to `status`,
//! so each body type is flattened into the envelope.
//!
//! Servers disagree on ID types (Subsonic uses numbers, Navidrome strings), so
//! IDs are normalized to strings on the way in.
//!
//! API Reference: https://www.subsonic.org/pages/api.jsp

use serde::{Deserialize, Deserializer};

/// Outer envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "subsonic-response")]
    pub response: Response<T>,
}

/// Status + payload
#[derive(Debug, Deserialize)]
pub struct Response<T> {
    /// "ok" or "failed"
    pub status: String,
    pub error: Option<ApiError>,
    #[serde(flatten)]
    pub body: T,
}

/// Error object on failed responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Body for calls whose payload we ignore
#[derive(Debug, Default, Deserialize)]
pub struct Empty {}

/// getMusicFolders
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MusicFoldersBody {
    pub music_folders: Option<MusicFolders>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MusicFolders {
    pub music_folder: Vec<MusicFolder>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MusicFolder {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// search3
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchBody {
    #[serde(rename = "searchResult3")]
    pub search_result: Option<SearchResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    pub song: Vec<Song>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Song {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// File path relative to the music folder (not exposed by every server)
    #[serde(default)]
    pub path: String,
}

/// getPlaylists
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlaylistsBody {
    pub playlists: Option<Playlists>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Playlists {
    pub playlist: Vec<Playlist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// createPlaylist (servers implementing API 1.14+ return the new playlist)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlaylistBody {
    pub playlist: Option<Playlist>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
