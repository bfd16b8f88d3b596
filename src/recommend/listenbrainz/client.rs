//! ListenBrainz HTTP client

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;

use super::{adapter, dto};
use crate::config::Discovery;
use crate::http::{HttpClient, parse_json};
use crate::model::Track;
use crate::recommend::{RecommendError, RecommendationSource};

const API_BASE: &str = "https://api.listenbrainz.org";

/// Recordings requested per recommendation call
const RECOMMENDATION_COUNT: &str = "50";

/// ListenBrainz API client
pub struct ListenBrainzClient {
    http: HttpClient,
    user: String,
    discovery: Discovery,
    single_artist: bool,
    separator: String,
}

impl ListenBrainzClient {
    pub fn new(
        user: impl Into<String>,
        discovery: Discovery,
        single_artist: bool,
        separator: impl Into<String>,
    ) -> Result<Self, RecommendError> {
        Self::with_base_url(API_BASE, user, discovery, single_artist, separator)
    }

    pub fn with_base_url(
        base_url: &str,
        user: impl Into<String>,
        discovery: Discovery,
        single_artist: bool,
        separator: impl Into<String>,
    ) -> Result<Self, RecommendError> {
        Ok(Self {
            http: HttpClient::new(base_url, HeaderMap::new())?,
            user: user.into(),
            discovery,
            single_artist,
            separator: separator.into(),
        })
    }

    /// MBID of the user's current weekly exploration playlist
    async fn weekly_exploration_id(&self) -> Result<String, RecommendError> {
        let path = format!(
            "/1/user/{}/playlists/createdfor",
            urlencoding::encode(&self.user)
        );
        let request = self.http.request(Method::GET, &path);
        let response: dto::CreatedForResponse = self.http.send_json(request).await?;

        adapter::find_weekly_exploration(&response).ok_or_else(|| {
            RecommendError::NotFound(format!(
                "no {} playlist for {}",
                adapter::WEEKLY_EXPLORATION,
                self.user
            ))
        })
    }

    async fn playlist(&self, mbid: &str) -> Result<dto::Playlist, RecommendError> {
        let path = format!("/1/playlist/{}", urlencoding::encode(mbid));
        let request = self.http.request(Method::GET, &path);
        let wrapper: dto::PlaylistWrapper = self.http.send_json(request).await?;
        Ok(wrapper.playlist)
    }

    async fn playlist_tracks(&self) -> Result<Vec<Track>, RecommendError> {
        let mbid = self.weekly_exploration_id().await?;
        tracing::debug!("Weekly exploration playlist {}", mbid);

        let playlist = self.playlist(&mbid).await?;
        Ok(adapter::to_tracks(playlist, self.single_artist, &self.separator))
    }

    /// Recording recommendations; the server answers 204 when it has none
    async fn recommended_recordings(
        &self,
    ) -> Result<Vec<dto::RecommendedRecording>, RecommendError> {
        let path = format!(
            "/1/cf/recommendation/user/{}/recording",
            urlencoding::encode(&self.user)
        );
        let request = self
            .http
            .request(Method::GET, &path)
            .query(&[("count", RECOMMENDATION_COUNT)]);
        let body = self.http.send(request).await?;
        if body.is_empty() {
            return Err(RecommendError::NotFound(format!(
                "no recording recommendations for {}",
                self.user
            )));
        }

        let response: dto::RecommendationResponse = parse_json(&body)?;
        Ok(response.payload.mbids)
    }

    async fn recording_metadata(
        &self,
        recordings: &[dto::RecommendedRecording],
    ) -> Result<dto::RecordingMetadataResponse, RecommendError> {
        let mbids = recordings
            .iter()
            .map(|r| r.recording_mbid.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let request = self
            .http
            .request(Method::GET, "/1/metadata/recording/")
            .query(&[("recording_mbids", mbids.as_str()), ("inc", "artist release")]);
        Ok(self.http.send_json(request).await?)
    }

    async fn recommended_tracks(&self) -> Result<Vec<Track>, RecommendError> {
        let recordings = self.recommended_recordings().await?;
        tracing::debug!("{} recording recommendations", recordings.len());
        if recordings.is_empty() {
            return Ok(Vec::new());
        }

        let metadata = self.recording_metadata(&recordings).await?;
        Ok(adapter::recordings_to_tracks(
            &recordings,
            &metadata,
            self.single_artist,
            &self.separator,
        ))
    }
}

#[async_trait]
impl RecommendationSource for ListenBrainzClient {
    async fn fetch_tracks(&self) -> Result<Vec<Track>, RecommendError> {
        let tracks = match self.discovery {
            Discovery::Playlist | Discovery::Test => self.playlist_tracks().await?,
            Discovery::Api => self.recommended_tracks().await?,
        };
        tracing::info!("Got {} recommendations from ListenBrainz", tracks.len());
        Ok(tracks)
    }

    fn label(&self) -> &str {
        "ListenBrainz"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, discovery: Discovery) -> ListenBrainzClient {
        ListenBrainzClient::with_base_url(&server.uri(), "rob", discovery, true, " ").unwrap()
    }

    #[test]
    fn test_client_settings() {
        let client = ListenBrainzClient::new("rob", Discovery::Playlist, true, " ").unwrap();
        assert_eq!(client.http.base_url(), API_BASE);
        assert_eq!(client.label(), "ListenBrainz");
    }

    #[tokio::test]
    async fn test_api_discovery_resolves_recordings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1/cf/recommendation/user/rob/recording"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payload": {
                "user_name": "rob",
                "mbids": [
                    {"recording_mbid": "r2", "score": 0.9},
                    {"recording_mbid": "r1", "score": 0.7}
                ]
            }})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/1/metadata/recording/"))
            .and(query_param("recording_mbids", "r2,r1"))
            .and(query_param("inc", "artist release"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "r1": {
                    "recording": {"name": "First"},
                    "artist": {"name": "A feat. B", "artists": [{"name": "A"}, {"name": "B"}]},
                    "release": {"name": "Album"}
                },
                "r2": {
                    "recording": {"name": "Second"},
                    "artist": {"name": "C", "artists": [{"name": "C"}]}
                }
            })))
            .mount(&server)
            .await;

        let tracks = client_for(&server, Discovery::Api).fetch_tracks().await.unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].title, "Second");
        assert_eq!(tracks[0].artist, "C");
        assert_eq!(tracks[1].title, "First");
        assert_eq!(tracks[1].artist, "A");
        assert_eq!(tracks[1].album, "Album");
    }

    #[tokio::test]
    async fn test_api_discovery_without_recommendations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1/cf/recommendation/user/rob/recording"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let result = client_for(&server, Discovery::Api).fetch_tracks().await;
        assert!(matches!(result, Err(RecommendError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_playlist_discovery_reads_weekly_exploration() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1/user/rob/playlists/createdfor"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"playlists": [
                {"playlist": {
                    "title": "Weekly Exploration for rob",
                    "identifier": "https://listenbrainz.org/playlist/bbb"
                }}
            ]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/1/playlist/bbb"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"playlist": {
                "title": "Weekly Exploration for rob",
                "track": [{"title": "Song", "creator": "Artist", "album": "Album"}]
            }})))
            .mount(&server)
            .await;

        let tracks = client_for(&server, Discovery::Playlist)
            .fetch_tracks()
            .await
            .unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].file(), "Artist Song");
    }
}
