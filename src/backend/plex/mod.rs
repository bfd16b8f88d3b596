//! Plex Media Server integration
//!
//! Uses a configured token, or signs in to plex.tv with username/password to
//! obtain one.

mod client;
pub mod dto;

pub use client::PlexClient;
