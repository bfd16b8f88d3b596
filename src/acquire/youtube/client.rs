//! YouTube search client

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;

use super::dto;
use crate::acquire::{AcquireError, Candidate, VideoSearch};
use crate::http::HttpClient;

const API_BASE: &str = "https://youtube.googleapis.com/youtube/v3";

/// Music category, keeps vlogs and reaction videos out of the results
const MUSIC_CATEGORY: &str = "10";

pub struct YoutubeClient {
    http: HttpClient,
    api_key: Option<String>,
}

impl YoutubeClient {
    /// Create a client, failing when no API key is set
    pub fn new(api_key: Option<&str>) -> Result<Self, AcquireError> {
        let client = Self::unchecked(api_key)?;
        client.api_key()?;
        Ok(client)
    }

    /// Create a client whose API key is only required once a search runs
    pub fn unchecked(api_key: Option<&str>) -> Result<Self, AcquireError> {
        Ok(Self {
            http: HttpClient::new(API_BASE, HeaderMap::new())?,
            api_key: api_key.filter(|k| !k.is_empty()).map(String::from),
        })
    }

    fn api_key(&self) -> Result<&str, AcquireError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AcquireError::Config("youtube.api_key is not set".to_string()))
    }
}

fn to_candidates(response: dto::SearchResponse) -> Vec<Candidate> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            item.id.video_id.map(|id| Candidate {
                external_id: id,
                source_title: item.snippet.title,
                source_channel: item.snippet.channel_title,
            })
        })
        .collect()
}

#[async_trait]
impl VideoSearch for YoutubeClient {
    async fn search(&self, title: &str, artist: &str) -> Result<Vec<Candidate>, AcquireError> {
        let api_key = self.api_key()?;
        let query = format!("{} - {}", title, artist);
        let request = self.http.request(Method::GET, "/search").query(&[
            ("part", "snippet"),
            ("q", query.as_str()),
            ("type", "video"),
            ("videoCategoryId", MUSIC_CATEGORY),
            ("key", api_key),
        ]);

        let response: dto::SearchResponse = self.http.send_json(request).await?;
        let candidates = to_candidates(response);
        tracing::debug!("{} candidates for '{}'", candidates.len(), query);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(YoutubeClient::new(None), Err(AcquireError::Config(_))));
        assert!(matches!(YoutubeClient::new(Some("")), Err(AcquireError::Config(_))));
        assert!(YoutubeClient::new(Some("key")).is_ok());
    }

    #[tokio::test]
    async fn test_unchecked_client_fails_on_search() {
        let client = YoutubeClient::unchecked(None).unwrap();
        let result = client.search("Song", "Artist").await;
        assert!(matches!(result, Err(AcquireError::Config(_))));
    }

    #[test]
    fn test_candidates_skip_non_videos() {
        let json = r#"{"items":[
            {"id":{"kind":"youtube#channel"},"snippet":{"title":"Artist","channelTitle":"Artist"}},
            {"id":{"kind":"youtube#video","videoId":"v1"},"snippet":{"title":"Song","channelTitle":"Artist - Topic"}}
        ]}"#;
        let response: dto::SearchResponse = serde_json::from_str(json).unwrap();

        assert_eq!(
            to_candidates(response),
            vec![Candidate::new("v1", "Song", "Artist - Topic")]
        );
    }
}
