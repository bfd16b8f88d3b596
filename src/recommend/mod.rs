//! Recommendation sources.
//!
//! A source produces the ordered list of tracks a run should sync. The
//! ListenBrainz source reads the user's weekly exploration playlist or, in
//! `api` discovery mode, their recording recommendations; the file
//! source reads a local JSON list, for offline use and testing against a real
//! server.

pub mod file;
pub mod listenbrainz;

use std::path::Path;

use async_trait::async_trait;

use crate::config::Config;
use crate::http::TransportError;
use crate::model::Track;

pub use file::FileSource;
pub use listenbrainz::ListenBrainzClient;

/// Errors from recommendation sources
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("No recommendations found: {0}")]
    NotFound(String),

    #[error("Invalid recommendation data: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Something that can produce this run's tracks.
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    /// Tracks in playlist order.
    async fn fetch_tracks(&self) -> Result<Vec<Track>, RecommendError>;

    /// Name used in the playlist description
    fn label(&self) -> &str;
}

/// Pick the source for this run: a track file when given, else ListenBrainz.
pub fn from_config(
    config: &Config,
    tracks_file: Option<&Path>,
) -> Result<Box<dyn RecommendationSource>, RecommendError> {
    let separator = config.youtube.separator.clone();

    if let Some(path) = tracks_file {
        return Ok(Box::new(FileSource::new(path, separator)));
    }

    let user = config
        .listenbrainz
        .user
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| RecommendError::Config("listenbrainz.user is not set".to_string()))?;

    Ok(Box::new(ListenBrainzClient::new(
        user,
        config.listenbrainz.discovery,
        config.listenbrainz.single_artist,
        separator,
    )?))
}
