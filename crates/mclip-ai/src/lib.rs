//! AI scoring providers for candidate moments.
//!
//! This crate provides:
//! - The [`ScoringProvider`] capability trait the scorer depends on
//! - A tagged [`ProviderError`] (auth, quota, network, malformed, timeout)
//! - HTTP clients for Gemini and OpenAI-compatible chat APIs (OpenAI, Groq, DeepSeek)
//! - Explicit provider selection from configuration
//! - Retry with exponential backoff and request rate limiting

pub mod config;
pub mod error;
pub mod gemini;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod rate_limit;
pub mod retry;
pub mod types;

pub use config::{select_provider, ProviderConfig, ProviderKind, ProviderSelection};
pub use error::{ProviderError, ProviderErrorKind, ProviderResult};
pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatProvider;
pub use provider::{CandidateScore, ScoringProvider};
pub use rate_limit::ProviderRateLimiter;
pub use retry::{retry_if, FailureTracker, RetryConfig, RetryResult};
pub use types::{ProviderScore, ScoringBatch, ScoringItem};
