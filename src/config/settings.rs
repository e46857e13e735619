//! Configuration settings for Vidlearn.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub paths: PathSettings,
    pub media: MediaSettings,
    pub transcription: TranscriptionSettings,
    pub article: ArticleSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Input and output directory locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Root of the media tree to scan.
    pub input_dir: String,
    /// Root of the mirrored transcript tree (also holds transient audio).
    pub transcript_dir: String,
    /// Root of the mirrored learning article tree.
    pub article_dir: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            input_dir: "InputVideos".to_string(),
            transcript_dir: "OutputMarkdown".to_string(),
            article_dir: "LearningArticles".to_string(),
        }
    }
}

/// Supported audio file extensions (sent to the transcription service as-is).
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "flac", "aac", "ogg", "opus", "m4a", "wma", "aiff", "alac",
];

/// Supported video file extensions (audio will be extracted).
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "webm", "flv", "wmv", "m4v", "mpeg", "mpg", "3gp",
];

/// Media selection and audio preparation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Extensions picked up by discovery (case-insensitive).
    pub extensions: Vec<String>,
    /// Audio-only extensions submitted without transcoding.
    pub direct_extensions: Vec<String>,
    /// Audio format produced when transcoding.
    pub target_format: String,
    /// Probe for ffmpeg at startup. When false the run is forced into degraded mode.
    pub transcode: bool,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            extensions: AUDIO_EXTENSIONS
                .iter()
                .chain(VIDEO_EXTENSIONS)
                .map(|e| e.to_string())
                .collect(),
            direct_extensions: AUDIO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            target_format: "mp3".to_string(),
            transcode: true,
        }
    }
}

/// Speech-to-text service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Base URL of the AssemblyAI v2 API.
    pub api_base: String,
    /// Seconds between status polls while a transcript is queued or processing.
    pub poll_interval_seconds: u64,
    /// Timeout for each individual HTTP request.
    pub request_timeout_seconds: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.assemblyai.com/v2".to_string(),
            poll_interval_seconds: 3,
            request_timeout_seconds: 300,
        }
    }
}

/// Generative-text service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleSettings {
    /// Base URL of the Gemini REST API.
    pub api_base: String,
    /// Model identifier.
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// USD per 1000 input tokens.
    pub input_cost_per_1k: f64,
    /// USD per 1000 output tokens.
    pub output_cost_per_1k: f64,
    /// Timeout for the generation request.
    pub request_timeout_seconds: u64,
}

impl Default for ArticleSettings {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 4000,
            input_cost_per_1k: 0.000075,
            output_cost_per_1k: 0.0003,
            request_timeout_seconds: 300,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else if path.is_some() {
            Err(crate::error::VidlearnError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidlearn")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded input directory path.
    pub fn input_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.input_dir)
    }

    /// Get the expanded transcript directory path.
    pub fn transcript_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.transcript_dir)
    }

    /// Get the expanded article directory path.
    pub fn article_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.article_dir)
    }
}
