//! Gemini `generateContent` scoring provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::provider::{CandidateScore, ScoringProvider};
use crate::rate_limit::ProviderRateLimiter;
use crate::types::{parse_scores, ScoringBatch};

/// Models tried after the configured one fails with a transient error.
///
/// A malformed response ends the chain: it goes back to the caller, which
/// falls back to local scoring.
pub const FALLBACK_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite"];

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    temperature: f32,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini scoring provider.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    models: Vec<String>,
    http: Client,
    limiter: ProviderRateLimiter,
}

impl GeminiProvider {
    /// `base_url` is the API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        requests_per_second: u32,
    ) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::network(format!("failed to build HTTP client: {e}")))?;

        let model = model.into();
        let mut models = vec![model.clone()];
        models.extend(
            FALLBACK_MODELS
                .iter()
                .filter(|m| **m != model)
                .map(|m| m.to_string()),
        );

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            models,
            http,
            limiter: ProviderRateLimiter::per_second(requests_per_second),
        })
    }

    /// Replace the fallback chain; the configured model stays first.
    pub fn with_fallback_models(mut self, fallbacks: &[&str]) -> Self {
        self.models.truncate(1);
        self.models.extend(fallbacks.iter().map(|m| m.to_string()));
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    async fn call_model(&self, model: &str, prompt: &str, batch: &ScoringBatch) -> ProviderResult<Vec<CandidateScore>> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: 0.2,
            },
        };

        self.limiter.acquire().await;

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ProviderError::malformed("no content in Gemini response"))?;

        parse_scores(text, batch)
    }
}

#[async_trait]
impl ScoringProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn score(&self, batch: &ScoringBatch) -> ProviderResult<Vec<CandidateScore>> {
        let prompt = build_prompt(batch);
        let mut last_error = None;

        for model in &self.models {
            debug!(model = %model, candidates = batch.len(), "Attempting Gemini scoring");
            match self.call_model(model, &prompt, batch).await {
                Ok(scores) => {
                    info!(model = %model, candidates = batch.len(), "Gemini scoring succeeded");
                    return Ok(scores);
                }
                Err(e) if e.disables_provider() || matches!(e, ProviderError::Malformed(_)) => return Err(e),
                Err(e) => {
                    warn!(model = %model, error = %e, "Gemini model failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::malformed("no Gemini models configured")))
    }
}
