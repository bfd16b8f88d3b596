//! Jellyfin and Emby integration
//!
//! Emby and Jellyfin share most of the MediaBrowser REST API. The differences
//! (auth header, URL prefix, playlist creation shape) live in [`Dialect`].
//!
//! API docs: https://api.jellyfin.org

mod client;
pub mod dto;

pub use client::{Dialect, JellyfinClient};
