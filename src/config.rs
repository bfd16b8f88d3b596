//! Configuration system using TOML files.
//!
//! Config is read from `--config <path>` or from the OS-standard config directory:
//! - Windows: %APPDATA%\discovery-sync\config.toml
//! - macOS: ~/Library/Application Support/discovery-sync/config.toml
//! - Linux: ~/.config/discovery-sync/config.toml
//!
//! Every field has a default, so a partial file is fine. Command-line flags and
//! their environment variables are applied on top (see `cli`).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Library name used when none is configured (Jellyfin, Emby, Plex)
pub const DEFAULT_LIBRARY_NAME: &str = "Explo";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which media server to sync to (auto-detected when unset)
    pub system: Option<System>,

    /// Verbose logging
    pub debug: bool,

    /// Media server connection settings
    pub backend: BackendConfig,

    /// Audio search and download settings
    pub youtube: YoutubeConfig,

    /// Recommendation source settings
    pub listenbrainz: ListenBrainzConfig,

    /// Playlist reconciliation settings
    pub playlist: PlaylistConfig,
}

/// Supported media server families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum System {
    Subsonic,
    Jellyfin,
    Emby,
    Plex,
    Mpd,
}

impl std::fmt::Display for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Subsonic => "subsonic",
            Self::Jellyfin => "jellyfin",
            Self::Emby => "emby",
            Self::Plex => "plex",
            Self::Mpd => "mpd",
        };
        f.write_str(name)
    }
}

/// Media server connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Server base URL (e.g. http://127.0.0.1:8096)
    pub url: String,

    /// API key / token (Jellyfin, Emby, Plex)
    pub api_key: Option<String>,

    /// Username (Subsonic, Plex sign-in)
    pub user: Option<String>,

    /// Password (Subsonic, Plex sign-in)
    pub password: Option<String>,

    /// Target library name
    pub library_name: Option<String>,

    /// User to own created playlists (Jellyfin/Emby)
    pub user_id: Option<String>,

    /// Directory where .m3u playlists are written (MPD)
    pub playlist_dir: Option<PathBuf>,

    /// MPD control address for library updates, e.g. 127.0.0.1:6600
    pub mpd_address: Option<String>,

    /// Subsonic API version to announce
    pub subsonic_version: String,

    /// Client name sent to the server
    pub client_id: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            user: None,
            password: None,
            library_name: None,
            user_id: None,
            playlist_dir: None,
            mpd_address: None,
            subsonic_version: "1.16.1".to_string(),
            client_id: "discovery-sync".to_string(),
        }
    }
}

/// Audio search and download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// YouTube Data API key
    pub api_key: Option<String>,

    /// Directory acquired audio is written to
    pub download_dir: PathBuf,

    /// Separator between artist and title in file names
    pub separator: String,

    /// Keywords that disqualify a candidate unless the track itself has them
    pub filter_list: Vec<String>,

    /// yt-dlp executable
    pub ytdlp_path: PathBuf,

    /// ffmpeg executable
    pub ffmpeg_path: PathBuf,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            download_dir: PathBuf::new(),
            separator: crate::model::DEFAULT_SEPARATOR.to_string(),
            filter_list: ["live", "remix", "instrumental", "extended"]
                .into_iter()
                .map(String::from)
                .collect(),
            ytdlp_path: PathBuf::from("yt-dlp"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
        }
    }
}

/// How recommendations are consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Discovery {
    /// The weekly exploration playlist
    #[default]
    Playlist,
    /// Same source, but stop after one successful download
    Test,
    /// Collaborative-filtering recording recommendations
    Api,
}

/// Recommendation source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenBrainzConfig {
    /// ListenBrainz user whose recommendations are synced
    pub user: Option<String>,

    /// Discovery mode
    pub discovery: Discovery,

    /// Use only the first credited artist as the track artist
    pub single_artist: bool,
}

impl Default for ListenBrainzConfig {
    fn default() -> Self {
        Self {
            user: None,
            discovery: Discovery::default(),
            single_artist: true,
        }
    }
}

/// Playlist reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Base playlist name
    pub name: String,

    /// Keep previous runs' playlists and downloads
    pub persist: bool,

    /// Trigger a library refresh once the playlist is in place
    pub refresh_after_sync: bool,

    /// Seconds to wait for the server to index new downloads
    pub scan_wait_secs: u64,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            name: "Discover-Weekly".to_string(),
            persist: true,
            refresh_after_sync: false,
            scan_wait_secs: 120,
        }
    }
}

impl Config {
    /// Pick the backend: explicit setting, else Subsonic credentials, else an MPD playlist dir.
    pub fn detect_system(&self) -> Result<System, ConfigError> {
        if let Some(system) = self.system {
            return Ok(system);
        }

        tracing::warn!("No system configured, trying to detect automatically");
        if self.backend.user.is_some() && self.backend.password.is_some() {
            tracing::info!("Using Subsonic");
            return Ok(System::Subsonic);
        }
        if self.backend.playlist_dir.is_some() {
            tracing::info!("Using Music Player Daemon");
            return Ok(System::Mpd);
        }
        Err(ConfigError::UndetectableSystem)
    }

    /// Check that everything `system` needs is present.
    pub fn validate(&self, system: System) -> Result<(), ConfigError> {
        let backend = &self.backend;

        if self.youtube.download_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing("youtube.download_dir"));
        }
        if system != System::Mpd && backend.url.is_empty() {
            return Err(ConfigError::Missing("backend.url"));
        }

        match system {
            System::Subsonic => {
                if backend.user.is_none() || backend.password.is_none() {
                    return Err(ConfigError::Missing("backend.user and backend.password"));
                }
            }
            System::Jellyfin | System::Emby => {
                if backend.api_key.is_none() {
                    return Err(ConfigError::Missing("backend.api_key"));
                }
            }
            System::Plex => {
                let has_login = backend.user.is_some() && backend.password.is_some();
                if backend.api_key.is_none() && !has_login {
                    return Err(ConfigError::Missing(
                        "backend.api_key or backend.user and backend.password",
                    ));
                }
            }
            System::Mpd => {
                if backend.playlist_dir.is_none() {
                    return Err(ConfigError::Missing("backend.playlist_dir"));
                }
            }
        }
        Ok(())
    }

    /// Playlist name for a run on `today`.
    ///
    /// Persistent runs get one playlist per ISO week; otherwise the bare name is reused.
    pub fn playlist_name(&self, today: NaiveDate) -> String {
        if self.playlist.persist {
            let week = today.iso_week();
            format!("{}-{}-Week{}", self.playlist.name, week.year(), week.week())
        } else {
            self.playlist.name.clone()
        }
    }

    /// Library name, falling back to the default.
    pub fn library_name(&self) -> &str {
        self.backend
            .library_name
            .as_deref()
            .unwrap_or(DEFAULT_LIBRARY_NAME)
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("discovery-sync"))
}

/// Get the full path to the default config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Where a loaded config came from.
///
/// Config is read before logging is set up, so [`load`] reports this instead
/// of logging it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Nothing at the default location
    Missing(PathBuf),
    NoConfigDir,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "Loaded config from {}", path.display()),
            Self::Missing(path) => {
                write!(f, "No config file found at {}, using defaults", path.display())
            }
            Self::NoConfigDir => write!(f, "Could not determine config directory, using defaults"),
        }
    }
}

/// Load configuration.
///
/// An explicit path must exist and parse. The default location is optional:
/// if there is no file there, defaults are used.
pub fn load(explicit: Option<&Path>) -> Result<(Config, ConfigSource), ConfigError> {
    if let Some(path) = explicit {
        return Ok((load_from(path)?, ConfigSource::File(path.to_path_buf())));
    }

    let Some(path) = config_path() else {
        return Ok((Config::default(), ConfigSource::NoConfigDir));
    };

    if !path.exists() {
        return Ok((Config::default(), ConfigSource::Missing(path)));
    }

    let config = load_from(&path)?;
    Ok((config, ConfigSource::File(path)))
}

/// Load and parse a specific config file
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Unable to detect system, please set `system` (subsonic, jellyfin, emby, plex or mpd)")]
    UndetectableSystem,
}

// ============================================================================
// Tests
// ============================================================================
