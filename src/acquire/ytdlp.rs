//! Audio download via yt-dlp.
//!
//! yt-dlp writes the best audio-only format to stdout, which is streamed to the
//! pipeline without touching disk in between.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::{AcquireError, AudioFetcher, AudioSource, AudioStream};

const TOOL: &str = "yt-dlp";

/// yt-dlp wrapper
pub struct YtDlp {
    path: PathBuf,
}

impl YtDlp {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `yt-dlp --version`, or an error when it cannot be run
    pub async fn version(&self) -> Result<String, AcquireError> {
        tool_version(TOOL, &self.path, "--version").await
    }

    fn args(external_id: &str) -> [&str; 8] {
        [
            "-f",
            "bestaudio",
            "--no-warnings",
            "--quiet",
            "-o",
            "-",
            // IDs may start with '-'
            "--",
            external_id,
        ]
    }
}

/// yt-dlp's stdout. The process is killed if the stream is dropped early.
struct YtDlpStream {
    child: Child,
    stdout: ChildStdout,
    /// Collects stderr so a failed download can say why
    stderr: Option<JoinHandle<String>>,
}

impl AsyncRead for YtDlpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}

#[async_trait]
impl AudioSource for YtDlpStream {
    /// Wait for yt-dlp to exit; a non-zero status means the bytes read were partial.
    async fn finish(&mut self) -> Result<(), AcquireError> {
        let status = self.child.wait().await?;
        let stderr = match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        if status.success() {
            return Ok(());
        }
        let stderr = stderr.trim();
        Err(AcquireError::Tool {
            tool: TOOL,
            message: if stderr.is_empty() {
                format!("exited with {}", status)
            } else {
                format!("exited with {}: {}", status, stderr)
            },
        })
    }
}

#[async_trait]
impl AudioFetcher for YtDlp {
    async fn fetch(&self, external_id: &str) -> Result<AudioStream, AcquireError> {
        tracing::debug!("Fetching {} with {}", external_id, TOOL);

        let mut child = Command::new(&self.path)
            .args(Self::args(external_id))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(TOOL, &self.path, e))?;

        let stdout = child.stdout.take().ok_or_else(|| AcquireError::Tool {
            tool: TOOL,
            message: "stdout not captured".to_string(),
        })?;
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut text = String::new();
                if let Err(e) = pipe.read_to_string(&mut text).await {
                    tracing::debug!("Could not read {} stderr: {}", TOOL, e);
                }
                text
            })
        });

        Ok(Box::new(YtDlpStream {
            child,
            stdout,
            stderr,
        }))
    }
}

/// Map a spawn failure, calling out a missing binary
pub(super) fn spawn_error(tool: &'static str, path: &Path, e: io::Error) -> AcquireError {
    let message = if e.kind() == io::ErrorKind::NotFound {
        format!("{} not found, install it or set its path in config", path.display())
    } else {
        format!("failed to start {}: {}", path.display(), e)
    };
    AcquireError::Tool { tool, message }
}

/// First line of `<tool> <flag>` output
pub(super) async fn tool_version(
    tool: &'static str,
    path: &Path,
    flag: &str,
) -> Result<String, AcquireError> {
    let output = Command::new(path)
        .arg(flag)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spawn_error(tool, path, e))?;

    if !output.status.success() {
        return Err(AcquireError::Tool {
            tool,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}
