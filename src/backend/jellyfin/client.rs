//! Jellyfin / Emby HTTP client
//!
//! Track lookup lists the target library and matches on file path, since our
//! downloads are named deterministically and the search endpoint does fuzzy
//! matching that would over-match.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use tokio::sync::OnceCell;

use super::dto;
use crate::backend::{BackendError, MediaBackend, required};
use crate::config::Config;
use crate::http::HttpClient;
use crate::model::{LibraryRef, PlaylistHandle, Track};

/// Which MediaBrowser server we are talking to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Jellyfin,
    Emby,
}

impl Dialect {
    fn name(self) -> &'static str {
        match self {
            Self::Jellyfin => "jellyfin",
            Self::Emby => "emby",
        }
    }

    /// Auth headers for an API key
    fn auth_headers(self, api_key: &str, client_id: &str) -> Result<HeaderMap, BackendError> {
        let (name, value) = match self {
            Self::Jellyfin => (
                AUTHORIZATION,
                format!("MediaBrowser Token=\"{}\", Client=\"{}\"", api_key, client_id),
            ),
            Self::Emby => (HeaderName::from_static("x-emby-token"), api_key.to_string()),
        };
        let value = HeaderValue::from_str(&value)
            .map_err(|e| BackendError::Config(format!("invalid API key: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(name, value);
        Ok(headers)
    }

    /// Emby serves its API under /emby
    fn base_url(self, url: &str) -> String {
        let url = url.trim_end_matches('/');
        match self {
            Self::Emby if !url.ends_with("/emby") => format!("{}/emby", url),
            _ => url.to_string(),
        }
    }
}

/// Jellyfin / Emby API client
pub struct JellyfinClient {
    http: HttpClient,
    dialect: Dialect,
    library_name: String,
    download_dir: String,
    user_id: Option<String>,
    library: OnceCell<LibraryRef>,
}

impl JellyfinClient {
    /// Create a new client from config
    pub fn new(config: &Config, dialect: Dialect) -> Result<Self, BackendError> {
        let backend = &config.backend;
        let api_key = required(&backend.api_key, "backend.api_key")?;
        let headers = dialect.auth_headers(api_key, &backend.client_id)?;

        Ok(Self {
            http: HttpClient::new(dialect.base_url(&backend.url), headers)?,
            dialect,
            library_name: config.library_name().to_string(),
            download_dir: config.youtube.download_dir.to_string_lossy().into_owned(),
            user_id: backend.user_id.clone(),
            library: OnceCell::new(),
        })
    }

    async fn virtual_folders(&self) -> Result<Vec<dto::VirtualFolder>, BackendError> {
        let request = self.http.request(Method::GET, "/Library/VirtualFolders");
        Ok(self.http.send_json(request).await?)
    }

    async fn find_library(&self) -> Result<Option<LibraryRef>, BackendError> {
        let folders = self.virtual_folders().await?;
        Ok(folders
            .into_iter()
            .find(|f| f.name == self.library_name)
            .and_then(|f| {
                f.item_id.map(|id| LibraryRef {
                    name: f.name,
                    id,
                })
            }))
    }

    /// Create a music library pointing at the download directory
    async fn add_library(&self) -> Result<(), BackendError> {
        tracing::info!(
            "Creating {} library '{}' at {}",
            self.dialect.name(),
            self.library_name,
            self.download_dir
        );
        let request = self
            .http
            .request(Method::POST, "/Library/VirtualFolders")
            .query(&[
                ("name", self.library_name.as_str()),
                ("paths", self.download_dir.as_str()),
                ("collectionType", "music"),
                ("refreshLibrary", "true"),
            ])
            .json(&dto::AddVirtualFolderRequest {
                library_options: dto::LibraryOptions::default(),
            });
        self.http.send(request).await?;
        Ok(())
    }

    async fn create(&self, name: &str, track_ids: &[String]) -> Result<String, BackendError> {
        let request = match self.dialect {
            Dialect::Jellyfin => self
                .http
                .request(Method::POST, "/Playlists")
                .json(&dto::CreatePlaylistRequest {
                    name,
                    ids: track_ids,
                    media_type: "Audio",
                    user_id: self.user_id.as_deref(),
                }),
            Dialect::Emby => {
                let mut query = vec![
                    ("Name", name.to_string()),
                    ("Ids", track_ids.join(",")),
                    ("MediaType", "Audio".to_string()),
                ];
                if let Some(ref user_id) = self.user_id {
                    query.push(("UserId", user_id.clone()));
                }
                self.http.request(Method::POST, "/Playlists").query(&query)
            }
        };

        let created: dto::PlaylistCreated = self.http.send_json(request).await?;
        Ok(created.id)
    }

    async fn add_to_playlist(&self, playlist_id: &str, track_id: &str) -> Result<(), BackendError> {
        let mut query = vec![("Ids", track_id.to_string())];
        if let Some(ref user_id) = self.user_id {
            query.push(("UserId", user_id.clone()));
        }
        let request = self
            .http
            .request(Method::POST, &format!("/Playlists/{}/Items", encode(playlist_id)))
            .query(&query);
        self.http.send(request).await?;
        Ok(())
    }
}

fn encode(segment: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(segment)
}

/// Find an item whose path contains the track's derived file name
fn match_item(items: &[dto::Item], track: &Track) -> Option<String> {
    items
        .iter()
        .find(|item| {
            item.path
                .as_deref()
                .is_some_and(|path| path.contains(track.file()))
        })
        .map(|item| item.id.clone())
}

#[async_trait]
impl MediaBackend for JellyfinClient {
    fn name(&self) -> &'static str {
        self.dialect.name()
    }

    async fn resolve_library(&self) -> Result<LibraryRef, BackendError> {
        let library = self
            .library
            .get_or_try_init(|| async {
                if let Some(library) = self.find_library().await? {
                    return Ok(library);
                }

                self.add_library().await.map_err(|e| {
                    tracing::error!(
                        "Failed to add library using the download path, set library_name to an existing library: {}",
                        e
                    );
                    e
                })?;

                self.find_library()
                    .await?
                    .ok_or_else(|| BackendError::LibraryNotFound(self.library_name.clone()))
            })
            .await
            .map_err(|e| match e {
                BackendError::Transport(ref t) if t.is_unauthorized() => {
                    BackendError::Unauthorized(self.dialect.name())
                }
                e => e,
            })?;
        Ok(library.clone())
    }

    async fn find_existing_track(&self, track: &Track) -> Result<Option<String>, BackendError> {
        let library = self.resolve_library().await?;
        let request = self.http.request(Method::GET, "/Items").query(&[
            ("ParentId", library.id.as_str()),
            ("Recursive", "true"),
            ("IncludeItemTypes", "Audio"),
            ("Fields", "Path"),
        ]);

        let response: dto::ItemsResponse = self.http.send_json(request).await?;
        Ok(match_item(&response.items, track))
    }

    async fn find_playlist(&self, name: &str) -> Result<Option<PlaylistHandle>, BackendError> {
        let request = self
            .http
            .request(Method::GET, "/Search/Hints")
            .query(&[("searchTerm", name), ("IncludeItemTypes", "Playlist")]);

        let response: dto::SearchHintsResponse = self.http.send_json(request).await?;
        Ok(response
            .search_hints
            .iter()
            .find(|hint| hint.name == name)
            .and_then(|hint| hint.native_id())
            .map(|id| PlaylistHandle {
                id: id.to_string(),
                name: name.to_string(),
            }))
    }

    async fn create_playlist(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<PlaylistHandle, BackendError> {
        let id = match self.create(name, track_ids).await {
            Ok(id) => id,
            Err(BackendError::Transport(e)) if e.is_rejection() => {
                tracing::warn!("Server rejected the track list ({}), adding tracks individually", e);
                let id = self.create(name, &[]).await?;
                for track_id in track_ids {
                    if let Err(e) = self.add_to_playlist(&id, track_id).await {
                        tracing::warn!("Failed to add {} to playlist: {}", track_id, e);
                    }
                }
                id
            }
            Err(e) => return Err(e),
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
        let request = self
            .http
            .request(Method::POST, &format!("/Items/{}", encode(&playlist.id)))
            .json(&dto::UpdateItemRequest {
                id: &playlist.id,
                name: &playlist.name,
                overview: description,
                genres: Vec::new(),
                tags: Vec::new(),
                provider_ids: HashMap::new(),
            });
        self.http.send(request).await?;
        Ok(())
    }

    async fn delete_playlist(&self, playlist: &PlaylistHandle) -> Result<(), BackendError> {
        let request = self
            .http
            .request(Method::DELETE, &format!("/Items/{}", encode(&playlist.id)));
        match self.http.send(request).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn refresh_library(&self, library: &LibraryRef) -> Result<(), BackendError> {
        let request = self
            .http
            .request(Method::POST, &format!("/Items/{}/Refresh", encode(&library.id)))
            .query(&[("Recursive", "true")]);
        self.http.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_SEPARATOR;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, dialect: Dialect) -> JellyfinClient {
        let mut config = Config::default();
        config.backend.url = server.uri();
        config.backend.api_key = Some("key".to_string());
        config.youtube.download_dir = "/data/explo".into();
        JellyfinClient::new(&config, dialect).unwrap()
    }

    /// `Ids` query values sent to the add-items endpoint, in order
    async fn added_ids(server: &MockServer, items_path: &str) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == items_path)
            .filter_map(|r| {
                r.url
                    .query_pairs()
                    .find(|(k, _)| k == "Ids")
                    .map(|(_, v)| v.into_owned())
            })
            .collect()
    }

    fn item(id: &str, path: Option<&str>) -> dto::Item {
        dto::Item {
            id: id.to_string(),
            name: String::new(),
            server_id: None,
            path: path.map(String::from),
            album: None,
            album_artist: None,
        }
    }

    #[test]
    fn test_jellyfin_auth_header() {
        let headers = Dialect::Jellyfin.auth_headers("abc", "discovery-sync").unwrap();
        assert_eq!(
            headers.get(AUTHORIZATION).unwrap(),
            "MediaBrowser Token=\"abc\", Client=\"discovery-sync\""
        );
    }

    #[test]
    fn test_emby_auth_header() {
        let headers = Dialect::Emby.auth_headers("abc", "discovery-sync").unwrap();
        assert_eq!(headers.get("x-emby-token").unwrap(), "abc");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_api_key_rejected() {
        assert!(Dialect::Jellyfin.auth_headers("bad\nkey", "c").is_err());
    }

    #[test]
    fn test_base_url_prefix() {
        assert_eq!(Dialect::Jellyfin.base_url("http://jf:8096/"), "http://jf:8096");
        assert_eq!(Dialect::Emby.base_url("http://emby:8096"), "http://emby:8096/emby");
        assert_eq!(Dialect::Emby.base_url("http://emby:8096/emby"), "http://emby:8096/emby");
    }

    #[test]
    fn test_match_item_by_path() {
        let track = Track::new("Song", "Artist", "", "", DEFAULT_SEPARATOR);
        let items = vec![
            item("1", None),
            item("2", Some("/music/explo/Other Song.mp3")),
            item("3", Some("/music/explo/Artist Song.mp3")),
        ];
        assert_eq!(match_item(&items, &track), Some("3".to_string()));
    }

    #[test]
    fn test_match_item_none() {
        let track = Track::new("Song", "Artist", "", "", DEFAULT_SEPARATOR);
        assert_eq!(match_item(&[item("1", Some("/x/y.mp3"))], &track), None);
    }

    #[test]
    fn test_client_settings() {
        let mut config = Config::default();
        config.backend.url = "http://jf:8096".to_string();
        config.backend.api_key = Some("key".to_string());
        config.youtube.download_dir = "/data/explo".into();

        let client = JellyfinClient::new(&config, Dialect::Emby).unwrap();

        assert_eq!(client.library_name, "Explo");
        assert_eq!(client.download_dir, "/data/explo");
        assert_eq!(client.http.base_url(), "http://jf:8096/emby");
    }

    #[tokio::test]
    async fn test_emby_server_error_falls_back_to_single_adds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emby/Playlists"))
            .and(query_param("Ids", "1,bad,2"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/emby/Playlists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Id": "pl9"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/emby/Playlists/pl9/Items"))
            .and(query_param("Ids", "bad"))
            .respond_with(ResponseTemplate::new(400))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/emby/Playlists/pl9/Items"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server, Dialect::Emby);
        let ids = vec!["1".to_string(), "bad".to_string(), "2".to_string()];
        let handle = client.create_playlist("P", &ids).await.unwrap();

        assert_eq!(handle.id, "pl9");
        assert_eq!(handle.name, "P");
        assert_eq!(
            added_ids(&server, "/emby/Playlists/pl9/Items").await,
            vec!["1", "bad", "2"]
        );
    }

    #[tokio::test]
    async fn test_jellyfin_rejected_list_creates_empty_then_adds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Playlists"))
            .and(body_json(json!({"Name": "P", "Ids": [], "MediaType": "Audio"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Id": "pl1"})))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Playlists"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Playlists/pl1/Items"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server, Dialect::Jellyfin);
        let ids = vec!["a".to_string(), "b".to_string()];
        let handle = client.create_playlist("P", &ids).await.unwrap();

        assert_eq!(handle.id, "pl1");
        assert_eq!(added_ids(&server, "/Playlists/pl1/Items").await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_create_unauthorized_does_not_fall_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Playlists"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server, Dialect::Jellyfin);
        let err = client
            .create_playlist("P", &["a".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Transport(ref e) if e.is_unauthorized()));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_library_is_created_then_listed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Library/VirtualFolders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Library/VirtualFolders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "Name": "Explo",
                "Locations": ["/data/explo"],
                "CollectionType": "music",
                "ItemId": "lib1"
            }])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Library/VirtualFolders"))
            .and(query_param("name", "Explo"))
            .and(query_param("paths", "/data/explo"))
            .and(query_param("collectionType", "music"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Dialect::Jellyfin);
        let library = client.resolve_library().await.unwrap();

        assert_eq!(library.name, "Explo");
        assert_eq!(library.id, "lib1");
        // Cached after the first resolution
        client.resolve_library().await.unwrap();
        let listings = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/Library/VirtualFolders" && r.method.as_str() == "GET")
            .count();
        assert_eq!(listings, 2);
    }

    #[tokio::test]
    async fn test_resolve_library_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Library/VirtualFolders"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server, Dialect::Jellyfin);
        let err = client.resolve_library().await.unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized("jellyfin")));
    }

    #[tokio::test]
    async fn test_delete_missing_playlist_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/Items/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server, Dialect::Jellyfin);
        let playlist = PlaylistHandle {
            id: "gone".to_string(),
            name: "P".to_string(),
        };
        client.delete_playlist(&playlist).await.unwrap();
    }
}
