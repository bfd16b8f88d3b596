//! Adapter layer: Convert ListenBrainz DTOs to tracks
//!
//! The only place JSPF playlists and recording metadata turn into [`Track`]s.

use super::dto;
use crate::model::Track;

/// Title marker of the weekly exploration playlist
pub const WEEKLY_EXPLORATION: &str = "Weekly Exploration";

/// MBID of the first weekly exploration playlist, if any
pub fn find_weekly_exploration(response: &dto::CreatedForResponse) -> Option<String> {
    response
        .playlists
        .iter()
        .map(|w| &w.playlist)
        .find(|p| p.title.contains(WEEKLY_EXPLORATION))
        .and_then(|p| playlist_mbid(&p.identifier))
}

/// Last path segment of a playlist identifier URL
fn playlist_mbid(identifier: &str) -> Option<String> {
    identifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Convert JSPF tracks into tracks.
///
/// With `single_artist`, the artist is just the first credited artist;
/// otherwise the full credit is kept.
pub fn to_tracks(playlist: dto::Playlist, single_artist: bool, separator: &str) -> Vec<Track> {
    playlist
        .track
        .into_iter()
        .filter(|t| !t.title.is_empty() && !t.creator.is_empty())
        .map(|t| {
            let main_artist = first_credit(&t).unwrap_or_else(|| t.creator.clone());
            let artist = if single_artist {
                main_artist.clone()
            } else {
                t.creator
            };
            Track::new(t.title, artist, main_artist, t.album, separator)
        })
        .collect()
}

/// Convert recommended recordings into tracks, in recommendation order.
///
/// Recordings without metadata, title or artist are dropped.
pub fn recordings_to_tracks(
    recommended: &[dto::RecommendedRecording],
    metadata: &dto::RecordingMetadataResponse,
    single_artist: bool,
    separator: &str,
) -> Vec<Track> {
    recommended
        .iter()
        .filter_map(|r| metadata.get(&r.recording_mbid))
        .filter(|m| !m.recording.name.is_empty() && !m.artist.name.is_empty())
        .map(|m| {
            let main_artist = m
                .artist
                .artists
                .first()
                .map(|a| a.name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| m.artist.name.clone());
            let artist = if single_artist {
                main_artist.clone()
            } else {
                m.artist.name.clone()
            };
            let album = m.release.as_ref().map(|r| r.name.as_str()).unwrap_or("");
            Track::new(m.recording.name.as_str(), artist, main_artist, album, separator)
        })
        .collect()
}

fn first_credit(track: &dto::JspfTrack) -> Option<String> {
    track
        .extension
        .get(dto::TRACK_EXTENSION)?
        .additional_metadata
        .artists
        .first()
        .map(|a| a.artist_credit_name.clone())
        .filter(|name| !name.is_empty())
}
