//! The acquisition pipeline.
//!
//! For each missing track: search, select a candidate, stream it to
//! `<download_dir>/<file>_TEMP`, transcode to `<download_dir>/<file>.mp3`, and
//! remove the temp file whatever happened. Tracks are processed one at a time,
//! in order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use super::selector::select_candidate;
use super::traits::{AudioFetcher, AudioStream, TrackTags, Transcoder, VideoSearch};
use super::AcquireError;
use crate::backend::MediaBackend;
use crate::model::{LibraryRef, Track};

const TEMP_SUFFIX: &str = "_TEMP";
const OUTPUT_EXTENSION: &str = "mp3";

/// Outcome of [`AcquisitionPipeline::acquire_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquisitionReport {
    /// Indices (into the track list) of tracks written to the download dir
    pub acquired: Vec<usize>,
    /// Number of tracks that were attempted and failed
    pub failed: usize,
}

/// Search → select → fetch → transcode, per track
pub struct AcquisitionPipeline {
    search: Box<dyn VideoSearch>,
    fetcher: Box<dyn AudioFetcher>,
    transcoder: Box<dyn Transcoder>,
    download_dir: PathBuf,
    filter_list: Vec<String>,
}

impl AcquisitionPipeline {
    pub fn new(
        search: Box<dyn VideoSearch>,
        fetcher: Box<dyn AudioFetcher>,
        transcoder: Box<dyn Transcoder>,
        download_dir: impl Into<PathBuf>,
        filter_list: Vec<String>,
    ) -> Self {
        Self {
            search,
            fetcher,
            transcoder,
            download_dir: download_dir.into(),
            filter_list,
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Final location of a track's audio
    pub fn output_path(&self, track: &Track) -> PathBuf {
        self.download_dir
            .join(format!("{}.{}", track.file(), OUTPUT_EXTENSION))
    }

    fn temp_path(&self, track: &Track) -> PathBuf {
        self.download_dir
            .join(format!("{}{}", track.file(), TEMP_SUFFIX))
    }

    /// Acquire every track that isn't present.
    ///
    /// Failures are logged and counted. With `single_item`, stops after the
    /// first success.
    pub async fn acquire_all(&self, tracks: &[Track], single_item: bool) -> AcquisitionReport {
        let mut report = AcquisitionReport::default();

        if let Err(e) = tokio::fs::create_dir_all(&self.download_dir).await {
            tracing::error!("Cannot create download dir {:?}: {}", self.download_dir, e);
            report.failed = tracks.iter().filter(|t| !t.is_present()).count();
            return report;
        }

        for (index, track) in tracks.iter().enumerate() {
            if track.is_present() {
                continue;
            }

            match self.acquire(track).await {
                Ok(path) => {
                    tracing::info!("Acquired '{}' by {} → {:?}", track.title, track.artist, path);
                    report.acquired.push(index);
                    if single_item {
                        tracing::info!("Single-item mode, stopping after one download");
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Could not acquire '{}' by {}: {}", track.title, track.artist, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Acquire one track, returning the path of the transcoded file.
    pub async fn acquire(&self, track: &Track) -> Result<PathBuf, AcquireError> {
        let candidates = self.search.search(&track.title, &track.artist).await?;
        let candidate = select_candidate(track, &candidates, &self.filter_list)
            .ok_or(AcquireError::NoCandidate)?;
        tracing::debug!(
            "Selected {} ('{}' from {}) for '{}'",
            candidate.external_id,
            candidate.source_title,
            candidate.source_channel,
            track.title
        );

        let stream = self.fetcher.fetch(&candidate.external_id).await?;

        let temp = self.temp_path(track);
        let output = self.output_path(track);
        let result = self.save(stream, &temp, &output, &TrackTags::from(track)).await;

        if let Err(e) = tokio::fs::remove_file(&temp).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("Failed to remove {:?}: {}", temp, e);
        }

        result.map(|()| output)
    }

    async fn save(
        &self,
        mut stream: AudioStream,
        temp: &Path,
        output: &Path,
        tags: &TrackTags,
    ) -> Result<(), AcquireError> {
        let mut file = tokio::fs::File::create(temp).await?;
        let written = tokio::io::copy(&mut stream, &mut file).await?;
        file.flush().await?;
        drop(file);
        stream.finish().await?;

        if written == 0 {
            return Err(AcquireError::EmptyStream);
        }

        self.transcoder.transcode(temp, output, tags).await
    }

    /// Give acquired tracks their backend IDs.
    ///
    /// Backends that index asynchronously are asked to rescan first, and given
    /// `scan_wait` to pick the new files up. Returns how many tracks resolved.
    pub async fn assign_ids(
        &self,
        backend: &dyn MediaBackend,
        library: &LibraryRef,
        tracks: &mut [Track],
        acquired: &[usize],
        scan_wait: Duration,
    ) -> usize {
        if acquired.is_empty() {
            return 0;
        }

        if backend.indexes_asynchronously() {
            if let Err(e) = backend.refresh_library(library).await {
                tracing::warn!("Library refresh failed: {}", e);
            }
            tracing::info!("Waiting {:?} for {} to index new files", scan_wait, backend.name());
            tokio::time::sleep(scan_wait).await;
        }

        let mut resolved = 0;
        for &index in acquired {
            let Some(track) = tracks.get_mut(index) else {
                continue;
            };
            match backend.find_existing_track(track).await {
                Ok(Some(id)) => {
                    track.mark_present(id);
                    resolved += 1;
                }
                Ok(None) => {
                    tracing::warn!("'{}' was downloaded but not found in the library", track.title)
                }
                Err(e) => tracing::warn!("Lookup for '{}' failed: {}", track.title, e),
            }
        }
        resolved
    }

    /// Delete every file (not directory) directly inside the download dir.
    ///
    /// Individual failures are logged. Returns the number of files removed.
    pub async fn clear_download_dir(&self) -> Result<usize, AcquireError> {
        let mut entries = match tokio::fs::read_dir(&self.download_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove {:?}: {}", entry.path(), e),
            }
        }

        tracing::info!("Removed {} files from {:?}", removed, self.download_dir);
        Ok(removed)
    }
}
