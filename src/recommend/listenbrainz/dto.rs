//! ListenBrainz API Data Transfer Objects
//!
//! Playlists are JSPF (https://xspf.org/jspf) with a MusicBrainz extension
//! carrying per-artist credits. Recording recommendations only carry MBIDs;
//! names come from the metadata endpoint.

use serde::Deserialize;
use std::collections::HashMap;

/// JSPF extension key for track-level MusicBrainz data
pub const TRACK_EXTENSION: &str = "https://musicbrainz.org/doc/jspf#track";

/// `GET /1/user/{user}/playlists/createdfor`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatedForResponse {
    pub playlists: Vec<PlaylistWrapper>,
}

/// Both endpoints wrap the playlist in `{"playlist": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistWrapper {
    pub playlist: Playlist,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    #[serde(default)]
    pub title: String,
    /// `https://listenbrainz.org/playlist/<mbid>`
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub track: Vec<JspfTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JspfTrack {
    #[serde(default)]
    pub title: String,
    /// Full artist credit
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub extension: HashMap<String, TrackExtension>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackExtension {
    pub additional_metadata: AdditionalMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdditionalMetadata {
    pub artists: Vec<ArtistCredit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistCredit {
    pub artist_credit_name: String,
    #[serde(default)]
    pub join_phrase: String,
}

/// `GET /1/cf/recommendation/user/{user}/recording`
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationResponse {
    pub payload: RecommendationPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecommendationPayload {
    pub mbids: Vec<RecommendedRecording>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendedRecording {
    pub recording_mbid: String,
    #[serde(default)]
    pub score: f64,
}

/// `GET /1/metadata/recording/`, keyed by recording MBID
pub type RecordingMetadataResponse = HashMap<String, RecordingMetadata>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordingMetadata {
    pub recording: Named,
    pub artist: ArtistMetadata,
    pub release: Option<Named>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Named {
    pub name: String,
}

/// Full credit in `name`, individual artists in `artists`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArtistMetadata {
    pub name: String,
    pub artists: Vec<Named>,
}
