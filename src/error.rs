//! Error types for Vidlearn.

use thiserror::Error;

/// Library-level error type for Vidlearn operations.
#[derive(Error, Debug)]
pub enum VidlearnError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Discovery failed: {0}")]
    Discovery(String),

    #[error("Missing credential: {0} is not set")]
    CredentialMissing(String),

    #[error("Transcoding failed: {0}")]
    Transcode(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Transcription returned no usable text: {0}")]
    EmptyTranscript(String),

    #[error("Article generation failed: {0}")]
    ArticleGeneration(String),

    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl VidlearnError {
    /// Whether this error terminates the whole run rather than a single job.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            VidlearnError::Discovery(_) | VidlearnError::CredentialMissing(_) | VidlearnError::Config(_)
        )
    }
}

/// Result type alias for Vidlearn operations.
pub type Result<T> = std::result::Result<T, VidlearnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_fatal_classification() {
        assert!(VidlearnError::Discovery("gone".into()).is_run_fatal());
        assert!(VidlearnError::CredentialMissing("GEMINI_API_KEY".into()).is_run_fatal());
        assert!(!VidlearnError::Transcription("boom".into()).is_run_fatal());
        assert!(!VidlearnError::ArticleGeneration("boom".into()).is_run_fatal());
        assert!(!VidlearnError::Transcode("boom".into()).is_run_fatal());
        assert!(!VidlearnError::Cleanup("source".into()).is_run_fatal());
    }

    #[test]
    fn test_credential_message_names_variable() {
        let err = VidlearnError::CredentialMissing("ASSEMBLYAI_API_KEY".into());
        assert!(err.to_string().contains("ASSEMBLYAI_API_KEY"));
    }
}
