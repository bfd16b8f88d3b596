//! Plex HTTP client
//!
//! Playlists are addressed by `ratingKey`; tracks by their metadata `key`
//! (`/library/metadata/<n>`), which is what playlist item URIs embed.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::sync::OnceCell;

use super::dto;
use crate::backend::{BackendError, MediaBackend, required};
use crate::config::Config;
use crate::http::HttpClient;
use crate::model::{LibraryRef, PlaylistHandle, Track};

const SIGN_IN_URL: &str = "https://plex.tv/users/sign_in.json";

const CLIENT_ID_HEADER: &str = "x-plex-client-identifier";
const TOKEN_HEADER: &str = "x-plex-token";

/// Plex Media Server client
pub struct PlexClient {
    http: HttpClient,
    library_name: String,
    library: OnceCell<LibraryRef>,
    machine_id: OnceCell<String>,
}

impl PlexClient {
    /// Create a client, signing in to plex.tv first when no token is configured.
    pub async fn connect(config: &Config) -> Result<Self, BackendError> {
        let backend = &config.backend;

        let token = match backend.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(token) => token.to_string(),
            None => {
                let user = required(&backend.user, "backend.user")?;
                let password = required(&backend.password, "backend.password")?;
                sign_in(SIGN_IN_URL, user, password, &backend.client_id).await?
            }
        };

        let mut headers = client_headers(&backend.client_id)?;
        headers.insert(HeaderName::from_static(TOKEN_HEADER), header_value(&token)?);

        Ok(Self {
            http: HttpClient::new(&backend.url, headers)?,
            library_name: config.library_name().to_string(),
            library: OnceCell::new(),
            machine_id: OnceCell::new(),
        })
    }

    /// Server machine identifier, needed to build playlist item URIs
    async fn machine_id(&self) -> Result<&str, BackendError> {
        let id = self
            .machine_id
            .get_or_try_init(|| async {
                let request = self.http.request(Method::GET, "/identity");
                let identity: dto::Container<dto::Identity> = self.http.send_json(request).await?;
                Ok::<_, BackendError>(identity.media_container.machine_identifier)
            })
            .await?;
        Ok(id)
    }

    async fn track_uri(&self, track_id: &str) -> Result<String, BackendError> {
        Ok(item_uri(self.machine_id().await?, track_id))
    }

    async fn add_to_playlist(&self, playlist_id: &str, track_id: &str) -> Result<(), BackendError> {
        let uri = self.track_uri(track_id).await?;
        let request = self
            .http
            .request(Method::PUT, &format!("/playlists/{}/items", playlist_id))
            .query(&[("uri", uri.as_str())]);
        self.http.send(request).await?;
        Ok(())
    }

    /// `POST /playlists`, optionally seeded with one item
    async fn post_playlist(
        &self,
        name: &str,
        seed: Option<&str>,
    ) -> Result<dto::Playlist, BackendError> {
        let mut query = vec![
            ("type", "audio".to_string()),
            ("title", name.to_string()),
            ("smart", "0".to_string()),
        ];
        if let Some(seed) = seed {
            query.push(("uri", self.track_uri(seed).await?));
        }

        let request = self.http.request(Method::POST, "/playlists").query(&query);
        let created: dto::Container<dto::Playlists> = self.http.send_json(request).await?;
        created
            .media_container
            .playlists
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse("no playlist in create response".into()))
    }
}

/// Exchange username/password for a token at plex.tv
async fn sign_in(
    url: &str,
    user: &str,
    password: &str,
    client_id: &str,
) -> Result<String, BackendError> {
    tracing::info!("Signing in to plex.tv as {}", user);
    let http = HttpClient::new(url, client_headers(client_id)?)?;

    let request = http
        .request(Method::POST, url)
        .json(&dto::SignInRequest {
            user: dto::SignInUser {
                login: user,
                password,
            },
        });

    let response: dto::SignInResponse = http.send_json(request).await.map_err(|e| {
        if e.is_unauthorized() {
            BackendError::Unauthorized("plex")
        } else {
            e.into()
        }
    })?;
    Ok(response.user.auth_token)
}

fn client_headers(client_id: &str) -> Result<HeaderMap, BackendError> {
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(CLIENT_ID_HEADER), header_value(client_id)?);
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, BackendError> {
    HeaderValue::from_str(value).map_err(|e| BackendError::Config(format!("invalid header: {}", e)))
}

/// `server://<machine>/com.plexapp.plugins.library/library/metadata/<n>`
fn item_uri(machine_id: &str, key: &str) -> String {
    format!(
        "server://{}/com.plexapp.plugins.library/{}",
        machine_id,
        key.trim_start_matches('/')
    )
}

/// First section whose title is the configured library name
fn match_section(sections: Vec<dto::Section>, name: &str) -> Option<LibraryRef> {
    sections
        .into_iter()
        .find(|s| s.title == name)
        .map(|s| LibraryRef {
            name: s.title,
            id: s.key,
        })
}

/// A track result with the same title and album. Without an album the artist
/// has to match instead.
fn match_result(results: &[dto::SearchResult], track: &Track) -> Option<String> {
    results
        .iter()
        .filter_map(|r| r.metadata.as_ref())
        .find(|m| {
            if m.item_type != "track" || !m.title.eq_ignore_ascii_case(&track.title) {
                return false;
            }
            if track.album.is_empty() {
                m.grandparent_title.eq_ignore_ascii_case(&track.main_artist)
                    || m.original_title
                        .as_deref()
                        .is_some_and(|a| a.eq_ignore_ascii_case(&track.artist))
            } else {
                m.parent_title == track.album
            }
        })
        .map(|m| m.key.clone())
}

#[async_trait]
impl MediaBackend for PlexClient {
    fn name(&self) -> &'static str {
        "plex"
    }

    async fn resolve_library(&self) -> Result<LibraryRef, BackendError> {
        let library = self
            .library
            .get_or_try_init(|| async {
                let request = self.http.request(Method::GET, "/library/sections");
                let sections: dto::Container<dto::Sections> =
                    self.http.send_json(request).await.map_err(|e| {
                        if e.is_unauthorized() {
                            BackendError::Unauthorized("plex")
                        } else {
                            e.into()
                        }
                    })?;

                match_section(sections.media_container.directories, &self.library_name)
                    .ok_or_else(|| BackendError::LibraryNotFound(self.library_name.clone()))
            })
            .await?;
        Ok(library.clone())
    }

    async fn find_existing_track(&self, track: &Track) -> Result<Option<String>, BackendError> {
        let library = self.resolve_library().await?;
        let request = self.http.request(Method::GET, "/library/search").query(&[
            ("query", track.title.as_str()),
            ("limit", "100"),
            ("searchTypes", "music"),
            ("sectionId", library.id.as_str()),
        ]);

        let results: dto::Container<dto::SearchResults> = self.http.send_json(request).await?;
        Ok(match_result(&results.media_container.results, track))
    }

    async fn find_playlist(&self, name: &str) -> Result<Option<PlaylistHandle>, BackendError> {
        let request = self
            .http
            .request(Method::GET, "/playlists")
            .query(&[("playlistType", "audio"), ("title", name)]);

        let playlists: dto::Container<dto::Playlists> = self.http.send_json(request).await?;
        Ok(playlists
            .media_container
            .playlists
            .into_iter()
            .find(|p| p.title == name)
            .map(|p| PlaylistHandle {
                id: p.rating_key,
                name: p.title,
            }))
    }

    async fn create_playlist(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<PlaylistHandle, BackendError> {
        // Identity failures must not read as a rejected seed
        if !track_ids.is_empty() {
            self.machine_id().await?;
        }

        // The first accepted ID seeds the playlist
        let mut playlist = None;
        let mut remaining = track_ids.iter();
        for track_id in remaining.by_ref() {
            match self.post_playlist(name, Some(track_id)).await {
                Ok(created) => {
                    playlist = Some(created);
                    break;
                }
                Err(BackendError::Transport(e)) if e.is_rejection() => {
                    tracing::warn!("Plex rejected {} as playlist seed: {}", track_id, e);
                }
                Err(e) => return Err(e),
            }
        }
        let playlist = match playlist {
            Some(playlist) => playlist,
            None => self.post_playlist(name, None).await?,
        };

        for track_id in remaining {
            if let Err(e) = self.add_to_playlist(&playlist.rating_key, track_id).await {
                tracing::warn!("Failed to add {} to playlist: {}", track_id, e);
            }
        }

        Ok(PlaylistHandle {
            id: playlist.rating_key,
            name: name.to_string(),
        })
    }

    async fn update_playlist_metadata(
        &self,
        playlist: &PlaylistHandle,
        description: &str,
    ) -> Result<(), BackendError> {
        let request = self
            .http
            .request(Method::PUT, &format!("/playlists/{}", playlist.id))
            .query(&[("title", playlist.name.as_str()), ("summary", description)]);
        self.http.send(request).await?;
        Ok(())
    }

    async fn delete_playlist(&self, playlist: &PlaylistHandle) -> Result<(), BackendError> {
        let request = self
            .http
            .request(Method::DELETE, &format!("/playlists/{}", playlist.id));
        match self.http.send(request).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn refresh_library(&self, library: &LibraryRef) -> Result<(), BackendError> {
        let request = self
            .http
            .request(Method::GET, &format!("/library/sections/{}/refresh", library.id));
        self.http.send(request).await?;
        Ok(())
    }
}
