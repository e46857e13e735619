//! Configuration module for Vidlearn.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ArticlePrompts, Prompts};
pub use settings::{
    ArticleSettings, GeneralSettings, MediaSettings, PathSettings, PromptSettings, Settings,
    TranscriptionSettings, AUDIO_EXTENSIONS, VIDEO_EXTENSIONS,
};
