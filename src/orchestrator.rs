//! Pipeline orchestrator for Vidlearn.
//!
//! Runs every discovered job through prepare, transcribe, compose, persist and
//! clean, one job at a time. A job's failure never stops the batch; only
//! discovery and credential problems end a run.
//!
//! The source file is deleted last and only after the article is on disk, so
//! an interrupted or failed job costs at most a repeat of its work.

use crate::article::{save_article, ArticleComposer, GeminiGenerator, TextGenerator};
use crate::audio::{AudioPreparer, FfmpegTranscoder, PreparationMode, Transcoder};
use crate::config::{Prompts, Settings};
use crate::discovery::{Discovery, MediaJob};
use crate::error::{Result, VidlearnError};
use crate::transcription::{format_transcript_markdown, AssemblyAiTranscriber, Transcriber, TranscriptStatus};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Preparing,
    Transcribing,
    Composing,
    Persisting,
    Cleaning,
    Done,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Preparing => write!(f, "preparing"),
            JobStage::Transcribing => write!(f, "transcribing"),
            JobStage::Composing => write!(f, "composing"),
            JobStage::Persisting => write!(f, "persisting"),
            JobStage::Cleaning => write!(f, "cleaning"),
            JobStage::Done => write!(f, "done"),
        }
    }
}

/// A job that reached `Done`.
#[derive(Debug)]
pub struct JobReport {
    pub job: MediaJob,
    pub mode: PreparationMode,
    pub transcript_path: PathBuf,
    pub article_path: PathBuf,
    pub cost_usd: f64,
    /// False when deleting the source failed; the job still counts as a success.
    pub source_removed: bool,
    /// Non-fatal cleanup problems, each a [`VidlearnError::Cleanup`].
    pub warnings: Vec<VidlearnError>,
}

/// A job that ended in `Failed`.
#[derive(Debug)]
pub struct JobFailure {
    pub job: MediaJob,
    /// Stage that was running when the job failed.
    pub stage: JobStage,
    pub error: VidlearnError,
    /// Set when the transcript was written before a later stage failed.
    pub transcript_path: Option<PathBuf>,
    pub mode: Option<PreparationMode>,
}

/// Terminal outcome of a job.
#[derive(Debug)]
pub enum JobOutcome {
    Done(JobReport),
    Failed(JobFailure),
}

impl JobOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, JobOutcome::Done(_))
    }

    pub fn job(&self) -> &MediaJob {
        match self {
            JobOutcome::Done(report) => &report.job,
            JobOutcome::Failed(failure) => &failure.job,
        }
    }

    pub fn mode(&self) -> Option<PreparationMode> {
        match self {
            JobOutcome::Done(report) => Some(report.mode),
            JobOutcome::Failed(failure) => failure.mode,
        }
    }
}

/// Batch-level counts over a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs sent to transcription without the audio extraction they needed.
    pub degraded: usize,
    /// Successful jobs that left a source file or temporary audio behind.
    pub cleanup_warnings: usize,
    pub total_cost_usd: f64,
    /// `(file, stage)` for each failed job.
    pub failures: Vec<(String, JobStage)>,
}

impl BatchSummary {
    /// Fold one job outcome into the totals.
    pub fn record(&mut self, outcome: &JobOutcome) {
        self.processed += 1;
        if outcome.mode() == Some(PreparationMode::Degraded) {
            self.degraded += 1;
        }
        match outcome {
            JobOutcome::Done(report) => {
                self.succeeded += 1;
                self.total_cost_usd += report.cost_usd;
                if !report.warnings.is_empty() {
                    self.cleanup_warnings += 1;
                }
            }
            JobOutcome::Failed(failure) => {
                self.failed += 1;
                self.failures.push((failure.job.display_name(), failure.stage));
            }
        }
    }
}

/// Progress a job has made that must be reported if it fails.
#[derive(Default)]
struct JobProgress {
    mode: Option<PreparationMode>,
    transcript_path: Option<PathBuf>,
    warnings: Vec<VidlearnError>,
}

/// The main orchestrator for the Vidlearn pipeline.
pub struct Orchestrator {
    preparer: AudioPreparer,
    transcriber: Arc<dyn Transcriber>,
    composer: ArticleComposer,
    input_dir: PathBuf,
    transcript_dir: PathBuf,
    article_dir: PathBuf,
    extensions: Vec<String>,
}

impl Orchestrator {
    /// Create an orchestrator with the real service clients.
    ///
    /// Fails with [`VidlearnError::CredentialMissing`] before anything is
    /// processed if either API key is absent. The transcoding capability is
    /// probed here, once.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let transcriber: Arc<dyn Transcriber> =
            Arc::new(AssemblyAiTranscriber::new(&settings.transcription)?);
        let generator: Arc<dyn TextGenerator> = Arc::new(GeminiGenerator::new(&settings.article)?);

        let transcoder: Option<Arc<dyn Transcoder>> = if settings.media.transcode {
            match FfmpegTranscoder::probe() {
                Some(ffmpeg) => Some(Arc::new(ffmpeg)),
                None => {
                    warn!("ffmpeg not found; video files will be sent to transcription directly");
                    None
                }
            }
        } else {
            info!("Transcoding disabled in configuration");
            None
        };

        info!(
            "Using AssemblyAI for transcription and {} for articles",
            generator.model()
        );

        Ok(Self::with_components(&settings, prompts, transcoder, transcriber, generator))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: &Settings,
        prompts: Prompts,
        transcoder: Option<Arc<dyn Transcoder>>,
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let transcript_dir = settings.transcript_dir();
        Self {
            preparer: AudioPreparer::new(transcoder, transcript_dir.clone(), &settings.media),
            transcriber,
            composer: ArticleComposer::new(generator, prompts, &settings.article),
            input_dir: settings.input_dir(),
            transcript_dir,
            article_dir: settings.article_dir(),
            extensions: settings.media.extensions.clone(),
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Whether this run can extract audio from video files.
    pub fn can_transcode(&self) -> bool {
        self.preparer.can_transcode()
    }

    /// Mirrored transcript location for a job.
    pub fn transcript_path(&self, job: &MediaJob) -> PathBuf {
        self.transcript_dir
            .join(&job.relative_subdir)
            .join(format!("{}.md", job.output_name()))
    }

    /// Mirrored article location for a job.
    pub fn article_path(&self, job: &MediaJob) -> PathBuf {
        self.article_dir
            .join(&job.relative_subdir)
            .join(format!("{}_article.md", job.output_name()))
    }

    /// Start discovery over the input root, creating the output roots.
    ///
    /// The input root is validated before anything is created, so a missing
    /// root leaves the filesystem untouched.
    pub fn discover(&self) -> Result<Discovery> {
        let discovery = Discovery::new(&self.input_dir, &self.extensions)?;
        std::fs::create_dir_all(&self.transcript_dir)?;
        std::fs::create_dir_all(&self.article_dir)?;
        Ok(discovery.excluding([&self.transcript_dir, &self.article_dir]))
    }

    /// Process every media file under the input root.
    ///
    /// Returns `Err` only for run-scoped problems; per-job failures are logged
    /// and counted in the summary.
    pub async fn run(&self) -> Result<BatchSummary> {
        info!("Checking for new media files in {}", self.input_dir.display());
        let discovery = self.discover()?;

        let mut summary = BatchSummary::default();
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        for job in discovery {
            eprintln!("[{}] Processing: {}", summary.processed + 1, job.display_name());
            let outcome = if claimed.insert(self.transcript_path(&job)) {
                self.process_job(&job).await
            } else {
                self.reject_duplicate(&job)
            };
            summary.record(&outcome);
        }

        info!(
            "Finished: {} processed, {} succeeded, {} failed",
            summary.processed, summary.succeeded, summary.failed
        );
        Ok(summary)
    }

    /// Run one job to a terminal outcome.
    #[instrument(skip(self, job), fields(file = %job.display_name()))]
    pub async fn process_job(&self, job: &MediaJob) -> JobOutcome {
        let mut stage = JobStage::Preparing;
        let mut progress = JobProgress::default();

        match self.drive(job, &mut stage, &mut progress).await {
            Ok(report) => {
                eprintln!("  Done.");
                JobOutcome::Done(report)
            }
            Err(e) => {
                error!("Error processing {} while {}: {}", job.filename, stage, e);
                eprintln!("  Failed while {}: {}", stage, e);
                if let Some(path) = &progress.transcript_path {
                    info!(
                        "Keeping transcript {}; source left in place for a later run",
                        path.display()
                    );
                }
                JobOutcome::Failed(JobFailure {
                    job: job.clone(),
                    stage,
                    error: e,
                    transcript_path: progress.transcript_path,
                    mode: progress.mode,
                })
            }
        }
    }

    /// Fail a job whose outputs were already claimed earlier in this run.
    ///
    /// The source stays in place and nothing is written.
    fn reject_duplicate(&self, job: &MediaJob) -> JobOutcome {
        let error = VidlearnError::InvalidInput(format!(
            "{} would overwrite outputs of another file in this run",
            self.transcript_path(job).display()
        ));
        error!("Skipping {}: {}", job.display_name(), error);
        eprintln!("  Failed while {}: {}", JobStage::Preparing, error);
        JobOutcome::Failed(JobFailure {
            job: job.clone(),
            stage: JobStage::Preparing,
            error,
            transcript_path: None,
            mode: None,
        })
    }

    async fn drive(
        &self,
        job: &MediaJob,
        stage: &mut JobStage,
        progress: &mut JobProgress,
    ) -> Result<JobReport> {
        let prepared = self.preparer.prepare(job).await;
        progress.mode = Some(prepared.mode);
        if prepared.mode == PreparationMode::Degraded {
            eprintln!("  Sending original file to transcription (no audio extraction).");
        }

        *stage = JobStage::Transcribing;
        eprintln!("  Transcribing...");
        let result = self.transcriber.transcribe(&prepared.audio_path).await;

        // Transient audio is disposable whatever the transcription outcome.
        if let Err(e) = prepared.discard() {
            let warning = VidlearnError::Cleanup(format!(
                "temporary audio {}: {}",
                prepared.audio_path.display(),
                e
            ));
            warn!("{}", warning);
            progress.warnings.push(warning);
        }

        let result = result?;
        let text = match result.status {
            TranscriptStatus::Completed => result.text,
            TranscriptStatus::Failed if result.is_empty_transcript() => {
                return Err(VidlearnError::EmptyTranscript(job.filename.clone()));
            }
            TranscriptStatus::Failed => {
                return Err(VidlearnError::Transcription(
                    result
                        .error_detail
                        .unwrap_or_else(|| "unknown error".to_string()),
                ));
            }
        };

        let transcript_path = self.transcript_path(job);
        write_document(&transcript_path, &format_transcript_markdown(&job.filename, &text))?;
        info!("Created transcript: {}", transcript_path.display());
        progress.transcript_path = Some(transcript_path.clone());

        *stage = JobStage::Composing;
        eprintln!("  Generating learning article...");
        let article = self.composer.compose(&text, &job.filename).await?;

        *stage = JobStage::Persisting;
        let article_path = self.article_path(job);
        if let Err(e) = save_article(&article, &article_path) {
            let _ = std::fs::remove_file(&article_path);
            return Err(e);
        }

        *stage = JobStage::Cleaning;
        let source_removed = match std::fs::remove_file(&job.source_path) {
            Ok(()) => {
                info!("Removed source file: {}", job.source_path.display());
                true
            }
            Err(e) => {
                let warning = VidlearnError::Cleanup(format!(
                    "source file {}: {}",
                    job.source_path.display(),
                    e
                ));
                warn!("{}", warning);
                progress.warnings.push(warning);
                false
            }
        };

        *stage = JobStage::Done;
        Ok(JobReport {
            job: job.clone(),
            mode: prepared.mode,
            transcript_path,
            article_path,
            cost_usd: article.metadata.estimated_cost_usd,
            source_removed,
            warnings: std::mem::take(&mut progress.warnings),
        })
    }
}

/// Write a whole document in one call, creating parent directories.
///
/// A failed write removes whatever partial file it left.
fn write_document(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Err(e) = std::fs::write(path, contents) {
        let _ = std::fs::remove_file(path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(rel: &str) -> MediaJob {
        MediaJob::from_path(Path::new("/in"), &Path::new("/in").join(rel)).unwrap()
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(JobStage::Transcribing.to_string(), "transcribing");
        assert_eq!(JobStage::Persisting.to_string(), "persisting");
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = BatchSummary::default();

        summary.record(&JobOutcome::Done(JobReport {
            job: job("a/one.mp4"),
            mode: PreparationMode::Degraded,
            transcript_path: PathBuf::from("t"),
            article_path: PathBuf::from("a"),
            cost_usd: 0.5,
            source_removed: false,
            warnings: vec![VidlearnError::Cleanup("source".into())],
        }));
        summary.record(&JobOutcome::Failed(JobFailure {
            job: job("b/two.mp3"),
            stage: JobStage::Composing,
            error: VidlearnError::ArticleGeneration("empty".into()),
            transcript_path: Some(PathBuf::from("t2")),
            mode: Some(PreparationMode::Direct),
        }));

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.degraded, 1);
        assert_eq!(summary.cleanup_warnings, 1);
        assert_eq!(summary.total_cost_usd, 0.5);
        assert_eq!(summary.failures, vec![("b/two.mp3".to_string(), JobStage::Composing)]);
    }

    #[test]
    fn test_write_document_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x/y/doc.md");
        write_document(&path, "# Transcript for a.mp4\n\nhi").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Transcript for a.mp4\n\nhi");
    }
}
