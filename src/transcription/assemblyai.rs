//! AssemblyAI transcription implementation.

use super::{TranscriptResult, Transcriber};
use crate::config::TranscriptionSettings;
use crate::error::{Result, VidlearnError};
use crate::http::{create_client_with_timeout, require_env};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable holding the AssemblyAI API key.
pub const ASSEMBLYAI_API_KEY_ENV: &str = "ASSEMBLYAI_API_KEY";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
}

/// Status values reported by the transcript endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteStatus {
    Queued,
    Processing,
    Completed,
    Error,
    Unknown,
}

impl From<&str> for RemoteStatus {
    fn from(value: &str) -> Self {
        match value {
            "queued" => RemoteStatus::Queued,
            "processing" => RemoteStatus::Processing,
            "completed" => RemoteStatus::Completed,
            "error" => RemoteStatus::Error,
            _ => RemoteStatus::Unknown,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl TranscriptResponse {
    /// Map a poll response to a terminal result, or `None` while still running.
    ///
    /// An unrecognised status is terminal so polling cannot run forever.
    fn terminal(self) -> Option<TranscriptResult> {
        match RemoteStatus::from(self.status.as_str()) {
            RemoteStatus::Completed => Some(TranscriptResult::completed(self.text.unwrap_or_default())),
            RemoteStatus::Error => Some(TranscriptResult::failed(
                self.error.unwrap_or_else(|| "unknown service error".to_string()),
            )),
            RemoteStatus::Unknown => Some(TranscriptResult::failed(format!(
                "unexpected transcript status '{}'",
                self.status
            ))),
            RemoteStatus::Queued | RemoteStatus::Processing => None,
        }
    }
}

/// AssemblyAI-based transcriber.
///
/// Uploads the file, creates a transcript job, then polls until it is
/// completed or errored.
pub struct AssemblyAiTranscriber {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    poll_interval: Duration,
}

impl AssemblyAiTranscriber {
    /// Create a transcriber using the key from `ASSEMBLYAI_API_KEY`.
    ///
    /// A missing key is a [`VidlearnError::CredentialMissing`], which aborts the run.
    pub fn new(settings: &TranscriptionSettings) -> Result<Self> {
        let api_key = require_env(ASSEMBLYAI_API_KEY_ENV)?;
        Self::with_api_key(&api_key, settings)
    }

    /// Create a transcriber with an explicit API key.
    pub fn with_api_key(api_key: &str, settings: &TranscriptionSettings) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(VidlearnError::CredentialMissing(ASSEMBLYAI_API_KEY_ENV.to_string()));
        }

        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.request_timeout_seconds))?,
            api_key: api_key.to_string(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(settings.poll_interval_seconds.max(1)),
        })
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(VidlearnError::Transcription(format!(
            "{} returned {}: {}",
            action,
            status,
            body.trim()
        )))
    }

    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn upload(&self, audio_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(audio_path).await?;
        debug!("Uploading {} bytes", bytes.len());

        let response = self
            .client
            .post(format!("{}/upload", self.api_base))
            .header("authorization", &self.api_key)
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| VidlearnError::Transcription(format!("Upload failed: {}", e)))?;

        let upload: UploadResponse = Self::check(response, "Upload").await?.json().await?;
        Ok(upload.upload_url)
    }

    async fn create_transcript(&self, audio_url: &str) -> Result<TranscriptResponse> {
        let response = self
            .client
            .post(format!("{}/transcript", self.api_base))
            .header("authorization", &self.api_key)
            .json(&TranscriptRequest { audio_url })
            .send()
            .await
            .map_err(|e| VidlearnError::Transcription(format!("Submit failed: {}", e)))?;

        Ok(Self::check(response, "Submit").await?.json().await?)
    }

    async fn fetch_transcript(&self, id: &str) -> Result<TranscriptResponse> {
        let response = self
            .client
            .get(format!("{}/transcript/{}", self.api_base, id))
            .header("authorization", &self.api_key)
            .send()
            .await
            .map_err(|e| VidlearnError::Transcription(format!("Status check failed: {}", e)))?;

        Ok(Self::check(response, "Status check").await?.json().await?)
    }
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptResult> {
        let audio_url = self.upload(audio_path).await?;
        let mut current = self.create_transcript(&audio_url).await?;
        info!("Submitted transcript {}", current.id);

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));

        loop {
            pb.set_message(format!("Transcribing ({})", current.status));
            let id = current.id.clone();
            if let Some(result) = current.terminal() {
                pb.finish_and_clear();
                return Ok(result);
            }

            tokio::time::sleep(self.poll_interval).await;
            current = match self.fetch_transcript(&id).await {
                Ok(next) => next,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };
        }
    }
}
