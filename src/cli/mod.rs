//! CLI module for Vidlearn.

mod output;
pub mod preflight;
mod run;

pub use output::Output;
pub use run::run_batch;

use crate::config::Settings;
use clap::Parser;

/// Vidlearn - Transcripts and Learning Articles from Media
///
/// Scans the input directory once, transcribes every audio/video file it
/// finds, writes a transcript and a learning article for each into mirrored
/// output trees, and removes the source once both exist.
#[derive(Parser, Debug)]
#[command(name = "vidlearn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory to scan for media files
    #[arg(short, long, env = "VIDLEARN_INPUT_DIR")]
    pub input: Option<String>,

    /// Directory for transcripts (mirrors the input tree)
    #[arg(short, long, env = "VIDLEARN_TRANSCRIPT_DIR")]
    pub transcripts: Option<String>,

    /// Directory for learning articles (mirrors the input tree)
    #[arg(short, long, env = "VIDLEARN_ARTICLE_DIR")]
    pub articles: Option<String>,
}

impl Cli {
    /// Apply path overrides from the command line on top of loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(input) = &self.input {
            settings.paths.input_dir = input.clone();
        }
        if let Some(transcripts) = &self.transcripts {
            settings.paths.transcript_dir = transcripts.clone();
        }
        if let Some(articles) = &self.articles {
            settings.paths.article_dir = articles.clone();
        }
    }
}
