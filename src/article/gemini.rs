//! Google Gemini text generation over the REST API.

use super::{GenerationConfig, TextGenerator};
use crate::config::ArticleSettings;
use crate::error::{Result, VidlearnError};
use crate::http::{create_client_with_timeout, require_env};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: RequestConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl From<&GenerationConfig> for RequestConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<String> {
        if let Some(error) = self.error {
            return Err(VidlearnError::ArticleGeneration(error.message));
        }

        let blocked = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(VidlearnError::ArticleGeneration(match blocked {
                Some(reason) => format!("Prompt blocked: {}", reason),
                None => "Response contained no candidates".to_string(),
            }));
        };

        if let Some(reason) = &candidate.finish_reason {
            debug!("Finish reason: {}", reason);
        }

        Ok(candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }
}

/// Gemini-based text generator.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GeminiGenerator {
    /// Create a generator using the key from `GEMINI_API_KEY`.
    pub fn new(settings: &ArticleSettings) -> Result<Self> {
        let api_key = require_env(GEMINI_API_KEY_ENV)?;
        Self::with_api_key(&api_key, settings)
    }

    /// Create a generator with an explicit API key.
    pub fn with_api_key(api_key: &str, settings: &ArticleSettings) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(VidlearnError::CredentialMissing(GEMINI_API_KEY_ENV.to_string()));
        }

        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.request_timeout_seconds))?,
            api_key: api_key.to_string(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt, config), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: config.into(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| VidlearnError::ArticleGeneration(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VidlearnError::ArticleGeneration(format!("Gemini response unreadable: {}", e)))?;

        let parsed: GenerateResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(VidlearnError::ArticleGeneration(format!(
                    "Gemini API returned {}: {}",
                    status,
                    body.trim()
                )));
            }
            Err(e) => {
                return Err(VidlearnError::ArticleGeneration(format!(
                    "Invalid Gemini response: {}",
                    e
                )));
            }
        };

        if !status.is_success() && parsed.error.is_none() {
            return Err(VidlearnError::ArticleGeneration(format!(
                "Gemini API returned {}",
                status
            )));
        }

        parsed.into_text()
    }
}
