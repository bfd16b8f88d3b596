//! Music Player Daemon backend
//!
//! MPD has no REST API: the download directory *is* the library, tracks are
//! identified by absolute path and playlists are `.m3u` files in the configured
//! playlist directory. When `mpd_address` is set, a library refresh sends the
//! `update` command over MPD's text protocol.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::backend::{BackendError, MediaBackend};
use crate::config::Config;
use crate::model::{LibraryRef, PlaylistHandle, Track};

const M3U_HEADER: &str = "#EXTM3U";
const DESCRIPTION_PREFIX: &str = "#DESCRIPTION:";

/// Filesystem-backed MPD library
pub struct MpdBackend {
    download_dir: PathBuf,
    playlist_dir: PathBuf,
    address: Option<String>,
}

impl MpdBackend {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let playlist_dir = config
            .backend
            .playlist_dir
            .clone()
            .ok_or_else(|| BackendError::Config("backend.playlist_dir is not set".to_string()))?;

        Ok(Self {
            download_dir: config.youtube.download_dir.clone(),
            playlist_dir,
            address: config.backend.mpd_address.clone(),
        })
    }

    fn playlist_path(&self, name: &str) -> PathBuf {
        self.playlist_dir.join(format!("{}.m3u", name))
    }

    fn track_path(&self, track: &Track) -> PathBuf {
        self.download_dir.join(format!("{}.mp3", track.file()))
    }

    /// Send a single command and read until `OK` or `ACK`
    async fn command(&self, address: &str, command: &str) -> Result<(), BackendError> {
        let stream = TcpStream::connect(address).await?;
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        let greeting = lines.next_line().await?.unwrap_or_default();
        if !greeting.starts_with("OK MPD") {
            return Err(BackendError::InvalidResponse(format!(
                "unexpected MPD greeting: {}",
                greeting
            )));
        }

        writer.write_all(format!("{}\n", command).as_bytes()).await?;

        while let Some(line) = lines.next_line().await? {
            if line == "OK" {
                return Ok(());
            }
            if let Some(message) = line.strip_prefix("ACK ") {
                return Err(BackendError::Api {
                    backend: "mpd",
                    code: 0,
                    message: message.to_string(),
                });
            }
            tracing::debug!("mpd: {}", line);
        }
        Err(BackendError::InvalidResponse(
            "MPD closed the connection".to_string(),
        ))
    }
}

/// Render an m3u playlist
fn render_playlist(description: Option<&str>, entries: &[String]) -> String {
    let mut out = String::from(M3U_HEADER);
    out.push('\n');
    if let Some(description) = description {
        out.push_str(DESCRIPTION_PREFIX);
        out.push_str(description);
        out.push('\n');
    }
    for entry in entries {
        out.push_str(entry);
        out.push('\n');
    }
    out
}

/// Playlist entries, ignoring comment lines
fn parse_entries(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[async_trait]
impl MediaBackend for MpdBackend {
    fn name(&self) -> &'static str {
        "mpd"
    }

    async fn resolve_library(&self) -> Result<LibraryRef, BackendError> {
        if !exists(&self.playlist_dir).await {
            return Err(BackendError::LibraryNotFound(
                self.playlist_dir.display().to_string(),
            ));
        }
        tokio::fs::create_dir_all(&self.download_dir).await?;

        Ok(LibraryRef {
            name: "mpd".to_string(),
            id: self.download_dir.display().to_string(),
        })
    }

    async fn find_existing_track(&self, track: &Track) -> Result<Option<String>, BackendError> {
        let path = self.track_path(track);
        Ok(exists(&path)
            .await
            .then(|| path.display().to_string()))
    }

    async fn find_playlist(&self, name: &str) -> Result<Option<PlaylistHandle>, BackendError> {
        let path = self.playlist_path(name);
        Ok(exists(&path).await.then(|| PlaylistHandle {
            id: path.display().to_string(),
            name: name.to_string(),
        }))
    }

    async fn create_playlist(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<PlaylistHandle, BackendError> {
        let mut entries = Vec::with_capacity(track_ids.len());
        for id in track_ids {
            if exists(Path::new(id)).await {
                entries.push(id.clone());
            } else {
                tracing::warn!("Skipping missing file {}", id);
            }
        }

        let path = self.playlist_path(name);
        tokio::fs::write(&path, render_playlist(None, &entries)).await?;
        tracing::debug!("Wrote {} entries to {:?}", entries.len(), path);

        Ok(PlaylistHandle {
            id: path.display().to_string(),
            name: name.to_string(),
        })
    }

    async fn update_playlist_metadata(
        &self,
        playlist: &PlaylistHandle,
        description: &str,
    ) -> Result<(), BackendError> {
        let contents = tokio::fs::read_to_string(&playlist.id).await?;
        let entries = parse_entries(&contents);
        tokio::fs::write(&playlist.id, render_playlist(Some(description), &entries)).await?;
        Ok(())
    }

    async fn delete_playlist(&self, playlist: &PlaylistHandle) -> Result<(), BackendError> {
        match tokio::fs::remove_file(&playlist.id).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn refresh_library(&self, _library: &LibraryRef) -> Result<(), BackendError> {
        match self.address {
            Some(ref address) => self.command(address, "update").await,
            None => {
                tracing::debug!("No mpd_address configured, skipping library update");
                Ok(())
            }
        }
    }

    fn indexes_asynchronously(&self) -> bool {
        false
    }
}
