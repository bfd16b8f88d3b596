//! Subsonic HTTP client
//!
//! All calls are `GET /rest/<method>.view` with auth and payload in the query
//! string. Failures come back as HTTP 200 with `status = "failed"`, so the
//! envelope is checked on every response.

use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use super::dto;
use crate::backend::{BackendError, MediaBackend, required};
use crate::config::Config;
use crate::http::HttpClient;
use crate::model::{LibraryRef, PlaylistHandle, Track};

/// Wrong username or password
const ERROR_WRONG_CREDENTIALS: i64 = 40;
/// Token authentication not supported for LDAP users
const ERROR_TOKEN_UNSUPPORTED: i64 = 41;
/// Requested data not found
const ERROR_NOT_FOUND: i64 = 70;

/// Subsonic API client
pub struct SubsonicClient {
    http: HttpClient,
    user: String,
    password: String,
    version: String,
    client_id: String,
    library_name: Option<String>,
    library: OnceCell<LibraryRef>,
}

impl SubsonicClient {
    /// Create a new client from config
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let backend = &config.backend;
        let user = required(&backend.user, "backend.user")?.to_string();
        let password = required(&backend.password, "backend.password")?.to_string();

        Ok(Self {
            http: HttpClient::new(&backend.url, HeaderMap::new())?,
            user,
            password,
            version: backend.subsonic_version.clone(),
            client_id: backend.client_id.clone(),
            library_name: backend.library_name.clone(),
            library: OnceCell::new(),
        })
    }

    /// Auth parameters with a fresh salt
    fn auth_params(&self) -> Vec<(&'static str, String)> {
        let salt: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        let token = format!("{:x}", md5::compute(format!("{}{}", self.password, salt)));

        vec![
            ("u", self.user.clone()),
            ("t", token),
            ("s", salt),
            ("v", self.version.clone()),
            ("c", self.client_id.clone()),
            ("f", "json".to_string()),
        ]
    }

    /// Call an API method and unwrap the envelope
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let request = self
            .http
            .request(Method::GET, &format!("/rest/{}.view", method))
            .query(&self.auth_params())
            .query(params);

        let envelope: dto::Envelope<T> = self.http.send_json(request).await?;
        check_status(envelope.response)
    }

    /// Scope searches to the resolved music folder, if any
    fn folder_param(&self, params: &mut Vec<(&str, String)>) {
        if let Some(library) = self.library.get()
            && !library.id.is_empty()
        {
            params.push(("musicFolderId", library.id.clone()));
        }
    }

    async fn add_to_playlist(&self, playlist_id: &str, track_id: &str) -> Result<(), BackendError> {
        let _: dto::Empty = self
            .call(
                "updatePlaylist",
                &[
                    ("playlistId", playlist_id.to_string()),
                    ("songIdToAdd", track_id.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    /// createPlaylist, returning the new playlist's ID
    async fn create(&self, name: &str, track_ids: &[String]) -> Result<String, BackendError> {
        let mut params = vec![("name", name.to_string())];
        params.extend(track_ids.iter().map(|id| ("songId", id.clone())));

        let body: dto::PlaylistBody = self.call("createPlaylist", &params).await?;
        if let Some(playlist) = body.playlist {
            return Ok(playlist.id);
        }

        // Pre-1.14 servers return an empty body
        self.find_playlist(name)
            .await?
            .map(|p| p.id)
            .ok_or_else(|| BackendError::InvalidResponse(format!("playlist '{}' not created", name)))
    }
}

/// Convert a failed envelope into an error
fn check_status<T>(response: dto::Response<T>) -> Result<T, BackendError> {
    if response.status == "ok" {
        return Ok(response.body);
    }

    let error = response.error.unwrap_or(dto::ApiError {
        code: 0,
        message: "unknown error".to_string(),
    });
    match error.code {
        ERROR_WRONG_CREDENTIALS | ERROR_TOKEN_UNSUPPORTED => Err(BackendError::Unauthorized("subsonic")),
        code => Err(BackendError::Api {
            backend: "subsonic",
            code,
            message: error.message,
        }),
    }
}

/// Pick the song matching `track` from search results.
///
/// A song matches on title plus artist (case-insensitive; the credited artist
/// may list more names than our main artist), or when its path contains the
/// track's file name, which is how our own downloads show up. A track without
/// an artist never matches on title alone.
fn match_song(songs: &[dto::Song], track: &Track) -> Option<String> {
    let title = track.title.to_lowercase();
    let main_artist = track.main_artist.to_lowercase();
    let artist = track.artist.to_lowercase();

    songs
        .iter()
        .find(|song| {
            let song_artist = song.artist.to_lowercase();
            let same_title = song.title.to_lowercase() == title;
            let same_artist = !artist.is_empty()
                && (song_artist == artist
                    || (!main_artist.is_empty() && song_artist.contains(&main_artist)));
            let same_file = !song.path.is_empty() && song.path.contains(track.file());
            (same_title && same_artist) || same_file
        })
        .map(|song| song.id.clone())
}

#[async_trait]
impl MediaBackend for SubsonicClient {
    fn name(&self) -> &'static str {
        "subsonic"
    }

    async fn resolve_library(&self) -> Result<LibraryRef, BackendError> {
        let library = self
            .library
            .get_or_try_init(|| async {
                let body: dto::MusicFoldersBody = self.call("getMusicFolders", &[]).await?;
                let folders = body.music_folders.unwrap_or_default().music_folder;

                let Some(ref wanted) = self.library_name else {
                    // No folder configured: search the whole catalog
                    return Ok(LibraryRef {
                        name: "all".to_string(),
                        id: String::new(),
                    });
                };

                folders
                    .into_iter()
                    .find(|f| &f.name == wanted)
                    .map(|f| LibraryRef {
                        name: f.name,
                        id: f.id,
                    })
                    .ok_or_else(|| BackendError::LibraryNotFound(wanted.clone()))
            })
            .await?;
        Ok(library.clone())
    }

    async fn find_existing_track(&self, track: &Track) -> Result<Option<String>, BackendError> {
        let mut params = vec![
            ("query", track.title.clone()),
            ("songCount", "50".to_string()),
            ("artistCount", "0".to_string()),
            ("albumCount", "0".to_string()),
        ];
        self.folder_param(&mut params);

        let body: dto::SearchBody = self.call("search3", &params).await?;
        let songs = body.search_result.unwrap_or_default().song;
        Ok(match_song(&songs, track))
    }

    async fn find_playlist(&self, name: &str) -> Result<Option<PlaylistHandle>, BackendError> {
        let body: dto::PlaylistsBody = self.call("getPlaylists", &[]).await?;
        Ok(body
            .playlists
            .unwrap_or_default()
            .playlist
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| PlaylistHandle {
                id: p.id,
                name: p.name,
            }))
    }

    async fn create_playlist(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<PlaylistHandle, BackendError> {
        let id = match self.create(name, track_ids).await {
            Ok(id) => id,
            Err(e @ BackendError::Unauthorized(_)) => return Err(e),
            Err(e) => {
                // One bad song ID fails the whole call; add them one at a time instead
                tracing::warn!("Bulk playlist creation failed ({}), adding tracks individually", e);
                let id = self.create(name, &[]).await?;
                for track_id in track_ids {
                    if let Err(e) = self.add_to_playlist(&id, track_id).await {
                        tracing::warn!("Failed to add {} to playlist: {}", track_id, e);
                    }
                }
                id
            }
        };

        Ok(PlaylistHandle {
            id,
            name: name.to_string(),
        })
    }

    async fn update_playlist_metadata(
        &self,
        playlist: &PlaylistHandle,
        description: &str,
    ) -> Result<(), BackendError> {
        let _: dto::Empty = self
            .call(
                "updatePlaylist",
                &[
                    ("playlistId", playlist.id.clone()),
                    ("name", playlist.name.clone()),
                    ("comment", description.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn delete_playlist(&self, playlist: &PlaylistHandle) -> Result<(), BackendError> {
        let result: Result<dto::Empty, _> = self
            .call("deletePlaylist", &[("id", playlist.id.clone())])
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(BackendError::Api {
                code: ERROR_NOT_FOUND,
                ..
            }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn refresh_library(&self, _library: &LibraryRef) -> Result<(), BackendError> {
        let _: dto::Empty = self.call("startScan", &[]).await?;
        Ok(())
    }
}
