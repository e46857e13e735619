//! Audio preparation.
//!
//! Decides per job whether the source can go to the transcription service
//! as-is or needs an audio-only copy first, and produces that copy when a
//! transcoding capability is available.

mod transcoder;

pub use transcoder::{FfmpegTranscoder, Transcoder};

use crate::config::MediaSettings;
use crate::discovery::MediaJob;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// How a job's audio was prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparationMode {
    /// Source was already an accepted audio-only format.
    Direct,
    /// A transient audio file was produced from the source.
    Transcoded,
    /// Source needed transcoding but none was possible; sent as-is.
    Degraded,
}

/// Audio ready for submission to the transcription service.
#[derive(Debug, Clone)]
pub struct PreparedAudio {
    pub audio_path: PathBuf,
    /// True only when `audio_path` was created for this job and must be removed.
    pub is_temporary: bool,
    pub mode: PreparationMode,
}

impl PreparedAudio {
    fn passthrough(path: &Path, mode: PreparationMode) -> Self {
        Self {
            audio_path: path.to_path_buf(),
            is_temporary: false,
            mode,
        }
    }

    /// Remove the transient audio file, if this is one.
    ///
    /// Never touches non-temporary paths, so it is safe to call on every outcome.
    pub fn discard(&self) -> std::io::Result<()> {
        if !self.is_temporary {
            return Ok(());
        }
        match std::fs::remove_file(&self.audio_path) {
            Ok(()) => {
                info!("Removed temporary audio: {}", self.audio_path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Turns a [`MediaJob`] into [`PreparedAudio`].
pub struct AudioPreparer {
    transcoder: Option<Arc<dyn Transcoder>>,
    work_dir: PathBuf,
    direct_extensions: Vec<String>,
    target_format: String,
}

impl AudioPreparer {
    /// Create a preparer.
    ///
    /// `transcoder` is the run's transcoding capability, decided once at
    /// startup; `None` puts every non-audio job into degraded mode.
    /// Transient files are written under `work_dir`, mirroring each job's
    /// relative subdirectory.
    pub fn new(
        transcoder: Option<Arc<dyn Transcoder>>,
        work_dir: impl Into<PathBuf>,
        media: &MediaSettings,
    ) -> Self {
        Self {
            transcoder,
            work_dir: work_dir.into(),
            direct_extensions: media.direct_extensions.iter().map(|e| e.to_lowercase()).collect(),
            target_format: media.target_format.to_lowercase(),
        }
    }

    /// Whether a transcoding capability is available for this run.
    pub fn can_transcode(&self) -> bool {
        self.transcoder.is_some()
    }

    /// Whether the job's extension can be submitted without transcoding.
    pub fn is_direct(&self, job: &MediaJob) -> bool {
        self.direct_extensions.contains(&job.extension)
    }

    /// Where the transient audio for `job` is written.
    pub fn transient_path(&self, job: &MediaJob) -> PathBuf {
        self.work_dir
            .join(&job.relative_subdir)
            .join(format!("{}.{}", job.output_name(), self.target_format))
    }

    /// Prepare audio for a job.
    ///
    /// Never fails: transcoding errors are logged and the original file is
    /// passed through in degraded mode.
    #[instrument(skip(self, job), fields(file = %job.display_name()))]
    pub async fn prepare(&self, job: &MediaJob) -> PreparedAudio {
        if self.is_direct(job) {
            return PreparedAudio::passthrough(&job.source_path, PreparationMode::Direct);
        }

        let Some(transcoder) = &self.transcoder else {
            warn!(
                "No transcoder available, sending {} to transcription directly",
                job.filename
            );
            return PreparedAudio::passthrough(&job.source_path, PreparationMode::Degraded);
        };

        let target = self.transient_path(job);
        if target == job.source_path {
            return PreparedAudio::passthrough(&job.source_path, PreparationMode::Direct);
        }

        if let Some(parent) = target.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(
                    "Cannot create {} for {}: {}; sending original file",
                    parent.display(),
                    job.filename,
                    e
                );
                return PreparedAudio::passthrough(&job.source_path, PreparationMode::Degraded);
            }
        }

        match transcoder.transcode(&job.source_path, &target).await {
            Ok(path) => {
                info!("Extracted audio to: {}", path.display());
                PreparedAudio {
                    audio_path: path,
                    is_temporary: true,
                    mode: PreparationMode::Transcoded,
                }
            }
            Err(e) => {
                warn!(
                    "{} failed for {}: {}; sending original file",
                    transcoder.name(),
                    job.filename,
                    e
                );
                // Drop any partial output so it cannot outlive the job.
                let _ = std::fs::remove_file(&target);
                PreparedAudio::passthrough(&job.source_path, PreparationMode::Degraded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, VidlearnError};
    use async_trait::async_trait;

    struct CopyTranscoder;

    #[async_trait]
    impl Transcoder for CopyTranscoder {
        fn name(&self) -> &str {
            "copy"
        }

        async fn transcode(&self, source: &Path, target: &Path) -> Result<PathBuf> {
            std::fs::copy(source, target)?;
            Ok(target.to_path_buf())
        }
    }

    struct BrokenTranscoder;

    #[async_trait]
    impl Transcoder for BrokenTranscoder {
        fn name(&self) -> &str {
            "broken"
        }

        async fn transcode(&self, _source: &Path, target: &Path) -> Result<PathBuf> {
            std::fs::write(target, b"partial")?;
            Err(VidlearnError::ToolNotFound("ffmpeg".into()))
        }
    }

    fn job_in(root: &Path, rel: &str) -> MediaJob {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"media").unwrap();
        MediaJob::from_path(root, &path).unwrap()
    }

    #[tokio::test]
    async fn test_audio_file_passes_through() {
        let input = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let job = job_in(input.path(), "b/clip.MP3");

        let preparer = AudioPreparer::new(
            Some(Arc::new(CopyTranscoder)),
            work.path(),
            &MediaSettings::default(),
        );
        let prepared = preparer.prepare(&job).await;

        assert_eq!(prepared.mode, PreparationMode::Direct);
        assert!(!prepared.is_temporary);
        assert_eq!(prepared.audio_path, job.source_path);
    }

    #[tokio::test]
    async fn test_video_is_transcoded_into_mirrored_work_dir() {
        let input = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let job = job_in(input.path(), "a/video1.mp4");

        let preparer = AudioPreparer::new(
            Some(Arc::new(CopyTranscoder)),
            work.path(),
            &MediaSettings::default(),
        );
        let prepared = preparer.prepare(&job).await;

        assert_eq!(prepared.mode, PreparationMode::Transcoded);
        assert!(prepared.is_temporary);
        assert_eq!(prepared.audio_path, work.path().join("a/video1.mp3"));
        assert!(prepared.audio_path.exists());

        prepared.discard().unwrap();
        assert!(!prepared.audio_path.exists());
        assert!(job.source_path.exists());
    }

    #[tokio::test]
    async fn test_no_transcoder_is_degraded() {
        let input = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let job = job_in(input.path(), "video1.mp4");

        let preparer = AudioPreparer::new(None, work.path(), &MediaSettings::default());
        assert!(!preparer.can_transcode());

        let prepared = preparer.prepare(&job).await;
        assert_eq!(prepared.mode, PreparationMode::Degraded);
        assert!(!prepared.is_temporary);
        assert_eq!(prepared.audio_path, job.source_path);
    }

    #[tokio::test]
    async fn test_failed_transcode_falls_back_and_cleans_partial_output() {
        let input = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let job = job_in(input.path(), "video1.mp4");

        let preparer = AudioPreparer::new(
            Some(Arc::new(BrokenTranscoder)),
            work.path(),
            &MediaSettings::default(),
        );
        let prepared = preparer.prepare(&job).await;

        assert_eq!(prepared.mode, PreparationMode::Degraded);
        assert_eq!(prepared.audio_path, job.source_path);
        assert!(!work.path().join("video1.mp3").exists());
    }

    #[test]
    fn test_discard_never_removes_passthrough_source() {
        let input = tempfile::tempdir().unwrap();
        let job = job_in(input.path(), "clip.mp3");
        let prepared = PreparedAudio::passthrough(&job.source_path, PreparationMode::Direct);

        prepared.discard().unwrap();
        assert!(job.source_path.exists());
    }
}
