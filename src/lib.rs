//! Vidlearn - Transcripts and Learning Articles from Media
//!
//! A batch CLI that turns a folder of local video and audio files into
//! markdown transcripts and expanded learning articles.
//!
//! # Overview
//!
//! For every media file under the input root, Vidlearn:
//! - extracts an audio track with ffmpeg when the file is a video (or sends
//!   it as-is when ffmpeg is unavailable)
//! - transcribes it with AssemblyAI and writes `<name>.md`
//! - asks Gemini for a structured learning article and writes `<name>_article.md`
//! - deletes the source once both documents exist
//!
//! Output trees mirror the input tree's subdirectories.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `discovery` - Recursive media file discovery
//! - `audio` - Audio preparation and transcoding
//! - `transcription` - Speech-to-text
//! - `article` - Learning article generation
//! - `orchestrator` - Per-job state machine and batch loop
//!
//! # Example
//!
//! ```rust,no_run
//! use vidlearn::config::Settings;
//! use vidlearn::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let summary = orchestrator.run().await?;
//!     println!("{} of {} files converted", summary.succeeded, summary.processed);
//!
//!     Ok(())
//! }
//! ```

pub mod article;
pub mod audio;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod transcription;

pub use error::{Result, VidlearnError};
