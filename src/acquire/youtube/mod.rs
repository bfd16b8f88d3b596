//! YouTube Data API search
//!
//! API docs: https://developers.google.com/youtube/v3/docs/search/list

mod client;
pub mod dto;

pub use client::YoutubeClient;
