//! Audio transcoding via ffmpeg.

use crate::error::{Result, VidlearnError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Capability to decode a media file and encode its audio track.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Short name of the backend, for log lines.
    fn name(&self) -> &str;

    /// Decode `source` and write an audio-only file at `target`.
    ///
    /// The target format is taken from `target`'s extension. Returns the path
    /// actually written.
    async fn transcode(&self, source: &Path, target: &Path) -> Result<PathBuf>;
}

/// Transcoder backed by the `ffmpeg` binary.
pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    /// Use `ffmpeg` from PATH.
    pub fn new() -> Self {
        Self::with_binary("ffmpeg")
    }

    /// Use a specific ffmpeg executable.
    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    /// Return a transcoder only if `ffmpeg -version` runs successfully.
    ///
    /// Called once at startup; the result is the run's transcoding capability.
    pub fn probe() -> Option<Self> {
        let transcoder = Self::new();
        match std::process::Command::new(&transcoder.binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => {
                info!("Found {} for audio extraction", transcoder.binary);
                Some(transcoder)
            }
            Ok(_) => {
                debug!("{} is installed but not working correctly", transcoder.binary);
                None
            }
            Err(e) => {
                debug!("{} not available: {}", transcoder.binary, e);
                None
            }
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        &self.binary
    }

    #[instrument(skip(self), fields(source = %source.display()))]
    async fn transcode(&self, source: &Path, target: &Path) -> Result<PathBuf> {
        debug!("Extracting audio to {:?}", target);

        let mut command = Command::new(&self.binary);
        command.arg("-i").arg(source).arg("-vn");

        let is_mp3 = target
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("mp3"));
        if is_mp3 {
            command.arg("-codec:a").arg("libmp3lame").arg("-qscale:a").arg("2");
        }

        let result = command
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg(target)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => Ok(target.to_path_buf()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(VidlearnError::Transcode(format!(
                    "{} conversion failed: {}",
                    self.binary,
                    err.trim()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(VidlearnError::ToolNotFound(self.binary.clone()))
            }
            Err(e) => Err(VidlearnError::Transcode(format!("{} error: {e}", self.binary))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let transcoder = FfmpegTranscoder::with_binary("vidlearn-no-such-ffmpeg");
        let dir = tempfile::tempdir().unwrap();
        let err = transcoder
            .transcode(&dir.path().join("in.mp4"), &dir.path().join("out.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, VidlearnError::ToolNotFound(_)));
    }

    #[test]
    fn test_probe_does_not_panic() {
        // Depends on the host; only checks the probe is safe to call.
        let _ = FfmpegTranscoder::probe();
    }
}
