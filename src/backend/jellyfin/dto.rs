//! Jellyfin / Emby API Data Transfer Objects
//!
//! Both servers share the MediaBrowser API shapes, PascalCase throughout.
//! Request bodies are typed here so names never get spliced into JSON by hand.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Entry from `GET /Library/VirtualFolders`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VirtualFolder {
    pub name: String,
    #[serde(default)]
    pub locations: Vec<String>,
    pub collection_type: Option<String>,
    pub item_id: Option<String>,
}

/// Body for `POST /Library/VirtualFolders`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddVirtualFolderRequest {
    pub library_options: LibraryOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LibraryOptions {
    pub enabled: bool,
    pub enable_realtime_monitor: bool,
    #[serde(rename = "EnableLUFSScan")]
    pub enable_lufs_scan: bool,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_realtime_monitor: true,
            enable_lufs_scan: false,
        }
    }
}

/// `GET /Items` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemsResponse {
    pub items: Vec<Item>,
    pub total_record_count: u32,
}

/// Catalog item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub server_id: Option<String>,
    /// Only present when requested with `Fields=Path`
    pub path: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
}

/// `GET /Search/Hints` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SearchHintsResponse {
    pub search_hints: Vec<SearchHint>,
    pub total_record_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchHint {
    pub id: Option<String>,
    /// Older servers and Emby only fill this one
    pub item_id: Option<String>,
    #[serde(default)]
    pub name: String,
}

impl SearchHint {
    pub fn native_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.item_id.as_deref())
    }
}

/// Body for `POST /Playlists` (Jellyfin)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatePlaylistRequest<'a> {
    pub name: &'a str,
    pub ids: &'a [String],
    pub media_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<&'a str>,
}

/// `POST /Playlists` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaylistCreated {
    pub id: String,
}

/// Body for `POST /Items/{id}`.
///
/// The server rejects the update with a 400 unless the list and map fields are
/// present, even when empty, so they are always sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemRequest<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub overview: &'a str,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub provider_ids: HashMap<String, String>,
}
