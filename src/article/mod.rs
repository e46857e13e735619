//! Learning article generation.
//!
//! Turns a transcript into a structured educational article through a
//! generative-text service and records what the call cost.

mod gemini;

pub use gemini::{GeminiGenerator, GEMINI_API_KEY_ENV};

use crate::config::{ArticleSettings, Prompts};
use crate::error::{Result, VidlearnError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Sampling parameters sent with each generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::from(&ArticleSettings::default())
    }
}

impl From<&ArticleSettings> for GenerationConfig {
    fn from(settings: &ArticleSettings) -> Self {
        Self {
            temperature: settings.temperature,
            top_p: settings.top_p,
            top_k: settings.top_k,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

/// Per-1000-token USD rates for a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl Pricing {
    /// Estimated cost of a call in USD.
    pub fn cost(&self, input_tokens: usize, output_tokens: usize) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_per_1k
            + (output_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

impl From<&ArticleSettings> for Pricing {
    fn from(settings: &ArticleSettings) -> Self {
        Self {
            input_per_1k: settings.input_cost_per_1k,
            output_per_1k: settings.output_cost_per_1k,
        }
    }
}

/// Trait for generative-text services.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier reported in article metadata.
    fn model(&self) -> &str;

    /// Generate text for `prompt`.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}

/// Run metadata attached to a generated article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub source_filename: String,
    /// Wall-clock duration of the generation call, rounded to 2 decimals.
    pub processing_time_seconds: f64,
    pub estimated_input_tokens: usize,
    pub estimated_output_tokens: usize,
    /// Rounded to 6 decimals.
    pub estimated_cost_usd: f64,
    pub model_identifier: String,
    /// Local time of completion, `%Y-%m-%d %H:%M:%S`.
    pub generated_at: String,
}

/// A generated article and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleResult {
    /// Markdown body, without the metadata footer.
    pub content: String,
    pub metadata: ArticleMetadata,
}

impl ArticleResult {
    /// The document written to disk: body followed by the metadata footer.
    pub fn render(&self) -> String {
        let m = &self.metadata;
        format!(
            "{}\n\n---\n\n**Article Generation Metadata:**\n\
             - Original Video: {}\n\
             - Generated: {}\n\
             - Processing Time: {:.2} seconds\n\
             - Model: {}\n\
             - Estimated Cost: ${:.6}\n\
             - Tokens: {} input, {} output\n",
            self.content,
            m.source_filename,
            m.generated_at,
            m.processing_time_seconds,
            m.model_identifier,
            m.estimated_cost_usd,
            format_thousands(m.estimated_input_tokens),
            format_thousands(m.estimated_output_tokens),
        )
    }
}

/// Rough token estimate: one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Human-readable title from a media filename.
///
/// Strips the extension and turns underscores and hyphens into spaces:
/// `My_Great-Talk.mp4` becomes `My Great Talk`.
pub fn title_from_filename(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .replace(['_', '-'], " ")
}

/// Format an integer with comma thousands separators.
pub fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Builds prompts, calls the generator, and assembles [`ArticleResult`]s.
pub struct ArticleComposer {
    generator: Arc<dyn TextGenerator>,
    prompts: Prompts,
    config: GenerationConfig,
    pricing: Pricing,
}

impl ArticleComposer {
    /// Create a composer from article settings.
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Prompts, settings: &ArticleSettings) -> Self {
        Self {
            generator,
            prompts,
            config: GenerationConfig::from(settings),
            pricing: Pricing::from(settings),
        }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Fill the article template for a transcript.
    pub fn build_prompt(&self, transcript: &str, title: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), title.to_string());
        vars.insert("transcript".to_string(), transcript.to_string());
        self.prompts.render_with_custom(&self.prompts.article.user, &vars)
    }

    /// Generate a learning article for `transcript`, produced from `source_filename`.
    ///
    /// An empty response or any service failure is an
    /// [`VidlearnError::ArticleGeneration`].
    #[instrument(skip(self, transcript), fields(file = %source_filename))]
    pub async fn compose(&self, transcript: &str, source_filename: &str) -> Result<ArticleResult> {
        let started = Instant::now();

        let title = title_from_filename(source_filename);
        let prompt = self.build_prompt(transcript, &title);
        let input_tokens = estimate_tokens(&prompt);

        info!("Generating learning article for: {}", source_filename);
        info!("Estimated input tokens: {}", format_thousands(input_tokens));

        let generated = self
            .generator
            .generate(&prompt, &self.config)
            .await
            .map_err(|e| {
                error!("Error generating article: {}", e);
                match e {
                    VidlearnError::ArticleGeneration(_) => e,
                    other => VidlearnError::ArticleGeneration(other.to_string()),
                }
            })?;

        let content = generated.trim().to_string();
        if content.is_empty() {
            error!("No content generated by {}", self.model());
            return Err(VidlearnError::ArticleGeneration(format!(
                "No content generated by {}",
                self.model()
            )));
        }

        let output_tokens = estimate_tokens(&content);
        let cost = self.pricing.cost(input_tokens, output_tokens);
        let elapsed = started.elapsed().as_secs_f64();

        info!("Article generated in {:.2} seconds", elapsed);
        info!("Estimated cost: ${:.6}", cost);
        info!("Output tokens: {}", format_thousands(output_tokens));

        Ok(ArticleResult {
            content,
            metadata: ArticleMetadata {
                source_filename: source_filename.to_string(),
                processing_time_seconds: round_to(elapsed, 2),
                estimated_input_tokens: input_tokens,
                estimated_output_tokens: output_tokens,
                estimated_cost_usd: round_to(cost, 6),
                model_identifier: self.model().to_string(),
                generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            },
        })
    }
}

/// Write an article with its metadata footer, creating parent directories.
///
/// The whole document goes out in a single write.
pub fn save_article(article: &ArticleResult, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, article.render()).map_err(|e| {
        error!("Error saving article to {}: {}", output_path.display(), e);
        VidlearnError::Io(e)
    })?;
    info!("Article saved to: {}", output_path.display());
    Ok(())
}
