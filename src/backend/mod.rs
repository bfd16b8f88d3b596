//! Media server backends.
//!
//! # Architecture
//!
//! Every server family implements [`MediaBackend`]. Each REST backend is split
//! the same way:
//! - **DTOs** (`dto.rs`) - Exact request/response shapes for that server
//! - **Client** (`client.rs`) - HTTP calls plus the matching rules for that dialect
//!
//! The MPD backend works on the local filesystem and has no DTOs.
//!
//! Which implementation is used is decided once, in [`connect`]. Nothing past
//! that point branches on the backend type.

pub mod jellyfin;
pub mod mpd;
pub mod plex;
pub mod subsonic;
pub mod traits;

use crate::config::{Config, System};
use crate::http::TransportError;

pub use jellyfin::{Dialect, JellyfinClient};
pub use mpd::MpdBackend;
pub use plex::PlexClient;
pub use subsonic::SubsonicClient;
pub use traits::MediaBackend;

/// Errors returned by backend operations
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{backend} error {code}: {message}")]
    Api {
        backend: &'static str,
        code: i64,
        message: String,
    },

    #[error("Credentials rejected by {0}")]
    Unauthorized(&'static str),

    #[error("No library named '{0}' found")]
    LibraryNotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Build the backend for `system`, running any authentication handshake it needs.
pub async fn connect(config: &Config, system: System) -> Result<Box<dyn MediaBackend>, BackendError> {
    tracing::info!("Using {}", system);

    let backend: Box<dyn MediaBackend> = match system {
        System::Subsonic => Box::new(SubsonicClient::new(config)?),
        System::Jellyfin => Box::new(JellyfinClient::new(config, Dialect::Jellyfin)?),
        System::Emby => Box::new(JellyfinClient::new(config, Dialect::Emby)?),
        System::Plex => Box::new(PlexClient::connect(config).await?),
        System::Mpd => Box::new(MpdBackend::new(config)?),
    };
    Ok(backend)
}

/// Fetch a required credential from config
fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, BackendError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BackendError::Config(format!("{} is not set", name)))
}
