//! Audio acquisition for tracks the backend doesn't have yet.
//!
//! # Architecture
//!
//! - **Traits** (`traits.rs`) - Seams for search, download and transcode
//! - **Selector** (`selector.rs`) - Which search result is acceptable
//! - **Pipeline** (`pipeline.rs`) - Per-track search → select → fetch → transcode
//! - **Collaborators** - `youtube` (search), `ytdlp` (download), `ffmpeg` (transcode)
//!
//! Every failure in here is per-track: the pipeline logs it and moves on.

pub mod ffmpeg;
pub mod pipeline;
pub mod selector;
pub mod traits;
pub mod youtube;
pub mod ytdlp;

use crate::http::TransportError;

pub use ffmpeg::Ffmpeg;
pub use pipeline::{AcquisitionPipeline, AcquisitionReport};
pub use selector::{passes_filter, select_candidate};
pub use traits::{AudioFetcher, AudioSource, AudioStream, Candidate, TrackTags, Transcoder, VideoSearch};
pub use youtube::YoutubeClient;
pub use ytdlp::YtDlp;

/// Errors from a single track's acquisition
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("No acceptable candidate")]
    NoCandidate,

    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },

    #[error("Downloaded stream was empty")]
    EmptyStream,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
