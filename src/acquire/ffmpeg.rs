//! Transcoding via ffmpeg

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::ytdlp::{spawn_error, tool_version};
use super::{AcquireError, TrackTags, Transcoder};

const TOOL: &str = "ffmpeg";

/// ffmpeg wrapper
pub struct Ffmpeg {
    path: PathBuf,
}

impl Ffmpeg {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn version(&self) -> Result<String, AcquireError> {
        tool_version(TOOL, &self.path, "-version").await
    }

    /// Overwrite output, keep audio streams only, write tags
    fn args(input: &Path, output: &Path, tags: &TrackTags) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-loglevel", "error", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(input.into());
        args.extend(["-map", "0:a"].map(OsString::from));
        for (key, value) in [
            ("artist", &tags.artist),
            ("title", &tags.title),
            ("album", &tags.album),
        ] {
            args.push("-metadata".into());
            args.push(format!("{}={}", key, value).into());
        }
        args.push(output.into());
        args
    }
}

#[async_trait]
impl Transcoder for Ffmpeg {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        tags: &TrackTags,
    ) -> Result<(), AcquireError> {
        let result = Command::new(&self.path)
            .args(Self::args(input, output, tags))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_error(TOOL, &self.path, e))?;

        if !result.status.success() {
            return Err(AcquireError::Tool {
                tool: TOOL,
                message: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
