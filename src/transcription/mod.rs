//! Transcription module for Vidlearn.
//!
//! Submits prepared audio to a speech-to-text service and waits for a
//! terminal result. Intermediate service states never reach the caller.

mod assemblyai;

pub use assemblyai::{AssemblyAiTranscriber, ASSEMBLYAI_API_KEY_ENV};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Detail recorded when the service reports success with no usable text.
pub const EMPTY_TRANSCRIPT_DETAIL: &str = "service returned an empty transcript";

/// Terminal status of a transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    Completed,
    Failed,
}

/// Terminal result of a transcription request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Transcript text; empty when `status` is `Failed`.
    pub text: String,
    pub status: TranscriptStatus,
    pub error_detail: Option<String>,
}

impl TranscriptResult {
    /// A completed transcript.
    ///
    /// Whitespace-only text is unusable and becomes a failed result.
    pub fn completed(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            return Self::empty();
        }
        Self {
            text,
            status: TranscriptStatus::Completed,
            error_detail: None,
        }
    }

    /// A failed transcript with the service-reported (or local) reason.
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            status: TranscriptStatus::Failed,
            error_detail: Some(detail.into()),
        }
    }

    /// Completed-but-empty, reported as a failure.
    pub fn empty() -> Self {
        Self::failed(EMPTY_TRANSCRIPT_DETAIL)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TranscriptStatus::Completed
    }

    /// Whether this failure was synthesized from an empty service response.
    pub fn is_empty_transcript(&self) -> bool {
        self.status == TranscriptStatus::Failed
            && self.error_detail.as_deref() == Some(EMPTY_TRANSCRIPT_DETAIL)
    }
}

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Submit an audio file and block until the service reaches a terminal state.
    ///
    /// Transport or protocol problems are returned as `Err`; a failure the
    /// service itself reports comes back as `Ok` with `status = Failed`.
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptResult>;
}

/// Render the transcript markdown document for `filename`.
pub fn format_transcript_markdown(filename: &str, text: &str) -> String {
    format!("# Transcript for {}\n\n{}", filename, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_with_text() {
        let result = TranscriptResult::completed("Hello world");
        assert!(result.is_completed());
        assert_eq!(result.text, "Hello world");
        assert!(result.error_detail.is_none());
    }

    #[test]
    fn test_blank_completed_becomes_failed() {
        let result = TranscriptResult::completed("  \n ");
        assert_eq!(result.status, TranscriptStatus::Failed);
        assert!(result.text.is_empty());
        assert!(result.is_empty_transcript());
    }

    #[test]
    fn test_failed_keeps_detail() {
        let result = TranscriptResult::failed("audio too short");
        assert!(!result.is_completed());
        assert!(!result.is_empty_transcript());
        assert_eq!(result.error_detail.as_deref(), Some("audio too short"));
    }

    #[test]
    fn test_transcript_markdown_format() {
        assert_eq!(
            format_transcript_markdown("talk.mp4", "Some words."),
            "# Transcript for talk.mp4\n\nSome words."
        );
    }
}
