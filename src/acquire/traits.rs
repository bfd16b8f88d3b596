//! Collaborator traits for the acquisition pipeline.
//!
//! The pipeline only knows these three seams: find candidates, fetch an audio
//! stream, transcode it. Production code plugs in the YouTube, yt-dlp and ffmpeg
//! implementations; tests substitute the mocks below.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::AcquireError;
use crate::model::Track;

/// Raw audio bytes from a fetcher.
///
/// Some failures only show once the bytes run out (a downloader exiting
/// non-zero after a partial write), so readers call [`AudioSource::finish`]
/// after reaching EOF.
#[async_trait]
pub trait AudioSource: AsyncRead + Unpin + Send {
    /// Report whether the stream that was just read was complete.
    async fn finish(&mut self) -> Result<(), AcquireError> {
        Ok(())
    }
}

/// Boxed [`AudioSource`] as returned by [`AudioFetcher::fetch`].
pub type AudioStream = Box<dyn AudioSource>;

/// A search result that might be the recommended track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Identifier the fetcher understands (video ID)
    pub external_id: String,
    /// Title as published by the source
    pub source_title: String,
    /// Publishing channel
    pub source_channel: String,
}

impl Candidate {
    pub fn new(
        external_id: impl Into<String>,
        source_title: impl Into<String>,
        source_channel: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            source_title: source_title.into(),
            source_channel: source_channel.into(),
        }
    }
}

/// Tags written into the transcoded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: String,
    pub title: String,
    pub album: String,
}

impl From<&Track> for TrackTags {
    fn from(track: &Track) -> Self {
        Self {
            artist: track.artist.clone(),
            title: track.title.clone(),
            album: track.album.clone(),
        }
    }
}

/// Search for candidate recordings of a track.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Candidates in the source's relevance order.
    async fn search(&self, title: &str, artist: &str) -> Result<Vec<Candidate>, AcquireError>;
}

/// Download the audio for a candidate.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(&self, external_id: &str) -> Result<AudioStream, AcquireError>;
}

/// Convert downloaded audio into the library format.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Write `output` from `input`, keeping only audio and tagging it.
    /// An existing `output` is overwritten.
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        tags: &TrackTags,
    ) -> Result<(), AcquireError>;
}
