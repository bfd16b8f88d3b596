//! ListenBrainz recommendations
//!
//! Reads the "Weekly Exploration" playlist ListenBrainz generates for a user,
//! or the user's collaborative-filtering recording recommendations.
//!
//! API docs: https://listenbrainz.readthedocs.io/en/latest/users/api/playlist.html

pub mod dto;
mod adapter;
mod client;

pub use client::ListenBrainzClient;
