//! OpenAI-compatible chat completion provider.
//!
//! OpenAI, Groq and DeepSeek all expose the same `/chat/completions` shape;
//! only the endpoint, model and key differ.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::provider::{CandidateScore, ScoringProvider};
use crate::rate_limit::ProviderRateLimiter;
use crate::types::{parse_scores, ScoringBatch};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Scoring provider for any OpenAI-compatible endpoint.
pub struct OpenAiCompatProvider {
    name: String,
    api_key: String,
    api_url: String,
    model: String,
    http: Client,
    limiter: ProviderRateLimiter,
}

impl OpenAiCompatProvider {
    /// `api_url` is the full `/chat/completions` URL.
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        requests_per_second: u32,
    ) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            api_key: api_key.into(),
            api_url: api_url.into(),
            model: model.into(),
            http,
            limiter: ProviderRateLimiter::per_second(requests_per_second),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ScoringProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn score(&self, batch: &ScoringBatch) -> ProviderResult<Vec<CandidateScore>> {
        let prompt = build_prompt(batch);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        self.limiter.acquire().await;
        debug!(
            provider = %self.name,
            model = %self.model,
            candidates = batch.len(),
            "Sending scoring request"
        );

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let chat: ChatResponse = response.json().await?;
        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::malformed("no content in chat response"))?;

        parse_scores(&text, batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;
    use crate::types::ScoringItem;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn batch() -> ScoringBatch {
        ScoringBatch::new(vec![
            ScoringItem::new(0, 10.0, 40.0, "what if I told you"),
            ScoringItem::new(1, 60.0, 90.0, "the secret is"),
        ])
    }

    fn provider(server: &MockServer) -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(
            "groq",
            "test-key",
            format!("{}/v1/chat/completions", server.uri()),
            "llama-3.1-8b-instant",
            Duration::from_secs(5),
            100,
        )
        .unwrap()
    }

    fn chat_body(content: &str) -> serde_json::Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    #[tokio::test]
    async fn test_scores_each_candidate() {
        let server = MockServer::start().await;
        let content = r#"{"scores":[
            {"id":0,"composite_score":8.5,"breakdown":{"engagement":9,"hook_strength":8}},
            {"id":1,"composite_score":6.0,"breakdown":{"engagement":6}}
        ]}"#;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
            .mount(&server)
            .await;

        let results = provider(&server).score(&batch()).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().composite_score, 8.5);
        assert_eq!(results[0].as_ref().unwrap().breakdown["hook_strength"], 8.0);
        assert_eq!(results[1].as_ref().unwrap().composite_score, 6.0);
    }

    #[tokio::test]
    async fn test_fenced_content_is_accepted() {
        let server = MockServer::start().await;
        let content = "```json\n{\"scores\":[{\"id\":0,\"composite_score\":7},{\"id\":1,\"composite_score\":5}]}\n```";
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
            .mount(&server)
            .await;

        let results = provider(&server).score(&batch()).await.unwrap();
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[tokio::test]
    async fn test_status_codes_map_to_error_kinds() {
        for (status, kind) in [
            (401, ProviderErrorKind::Auth),
            (429, ProviderErrorKind::Quota),
            (503, ProviderErrorKind::Network),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
                .mount(&server)
                .await;

            let err = provider(&server).score(&batch()).await.unwrap_err();
            assert_eq!(err.kind(), kind, "status {status}");
        }
    }

    #[tokio::test]
    async fn test_garbage_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("I think both are great!")))
            .mount(&server)
            .await;

        let err = provider(&server).score(&batch()).await.unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::Malformed);
    }
}
