//! Plex API Data Transfer Objects
//!
//! Plex wraps every JSON payload in a `MediaContainer`. Only the fields we read
//! are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};

/// Body for `POST https://plex.tv/users/sign_in.json`
#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest<'a> {
    pub user: SignInUser<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInUser<'a> {
    pub login: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    pub user: SignedInUser,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedInUser {
    pub auth_token: String,
}

/// Generic `{"MediaContainer": {...}}` wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct Container<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: T,
}

/// `GET /library/sections`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Sections {
    #[serde(rename = "Directory")]
    pub directories: Vec<Section>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    pub key: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub section_type: String,
    #[serde(rename = "Location", default)]
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub id: i64,
    pub path: String,
}

/// `GET /library/search`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchResults {
    #[serde(rename = "SearchResult")]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub score: f64,
    #[serde(rename = "Metadata")]
    pub metadata: Option<Metadata>,
}

/// Catalog item metadata
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub key: String,
    pub rating_key: Option<String>,
    #[serde(rename = "type", default)]
    pub item_type: String,
    /// Track title
    #[serde(default)]
    pub title: String,
    /// Artist
    #[serde(default)]
    pub grandparent_title: String,
    /// Album
    #[serde(default)]
    pub parent_title: String,
    /// Track artist, when it differs from the album artist
    pub original_title: Option<String>,
}

/// `GET /identity`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub machine_identifier: String,
}

/// `GET /playlists` and `POST /playlists`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Playlists {
    #[serde(rename = "Metadata")]
    pub playlists: Vec<Playlist>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub rating_key: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub playlist_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let json = r#"{"MediaContainer":{"size":2,"allowSync":false,"title1":"Plex Library",
            "Directory":[
                {"key":"1","title":"Movies","type":"movie","Location":[{"id":1,"path":"/movies"}]},
                {"key":"4","title":"Explo","type":"artist","Location":[{"id":4,"path":"/music/explo"}]}
            ]}}"#;

        let container: Container<Sections> = serde_json::from_str(json).unwrap();
        let sections = container.media_container.directories;

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].key, "4");
        assert_eq!(sections[1].locations[0].path, "/music/explo");
    }

    #[test]
    fn test_parse_search_results() {
        let json = r#"{"MediaContainer":{"size":1,"SearchResult":[{"score":0.9,"Metadata":{
            "librarySectionTitle":"Explo","key":"/library/metadata/123","ratingKey":"123",
            "type":"track","title":"Song","grandparentTitle":"Artist","parentTitle":"Album",
            "duration":180000}}]}}"#;

        let container: Container<SearchResults> = serde_json::from_str(json).unwrap();
        let metadata = container.media_container.results[0].metadata.clone().unwrap();

        assert_eq!(metadata.key, "/library/metadata/123");
        assert_eq!(metadata.item_type, "track");
        assert_eq!(metadata.parent_title, "Album");
    }

    #[test]
    fn test_parse_empty_search() {
        let json = r#"{"MediaContainer":{"size":0}}"#;
        let container: Container<SearchResults> = serde_json::from_str(json).unwrap();
        assert!(container.media_container.results.is_empty());
    }

    #[test]
    fn test_parse_playlists() {
        let json = r#"{"MediaContainer":{"size":1,"Metadata":[{"ratingKey":"555",
            "key":"/playlists/555/items","title":"Discover-Weekly","type":"playlist",
            "smart":false,"playlistType":"audio"}]}}"#;

        let container: Container<Playlists> = serde_json::from_str(json).unwrap();
        let playlist = &container.media_container.playlists[0];

        assert_eq!(playlist.rating_key, "555");
        assert_eq!(playlist.title, "Discover-Weekly");
    }

    #[test]
    fn test_sign_in_shapes() {
        let body = serde_json::to_value(SignInRequest {
            user: SignInUser {
                login: "me",
                password: "pw",
            },
        })
        .unwrap();
        assert_eq!(body["user"]["login"], "me");

        let response: SignInResponse =
            serde_json::from_str(r#"{"user":{"id":1,"authToken":"tok"}}"#).unwrap();
        assert_eq!(response.user.auth_token, "tok");
    }
}
