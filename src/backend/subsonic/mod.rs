//! Subsonic API integration (Subsonic, Navidrome, Airsonic, Gonic, ...)
//!
//! Authentication uses the salted token scheme: every request carries
//! `t = md5(password + salt)` with a fresh random salt.
//!
//! API docs: https://www.subsonic.org/pages/api.jsp

mod client;
pub mod dto;

pub use client::SubsonicClient;
