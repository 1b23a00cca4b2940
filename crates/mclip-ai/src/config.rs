//! Provider configuration and explicit selection.
//!
//! The provider is chosen once from configuration and handed to the scorer;
//! there is no global provider registry.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::gemini::GeminiProvider;
use crate::openai::OpenAiCompatProvider;
use crate::provider::ScoringProvider;

/// Which scoring backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// First provider with an API key, in order groq, deepseek, openai, gemini
    #[default]
    Auto,
    Gemini,
    OpenAi,
    Groq,
    DeepSeek,
    Local,
}

/// Static endpoint defaults for a remote provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderSettings {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl ProviderKind {
    /// Remote providers tried by `Auto`, in preference order.
    pub const AUTO_ORDER: [ProviderKind; 4] = [
        ProviderKind::Groq,
        ProviderKind::DeepSeek,
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::DeepSeek => "deepseek",
            Self::Local => "local",
        }
    }

    /// Endpoint defaults; `None` for `Auto` and `Local`.
    pub fn settings(&self) -> Option<ProviderSettings> {
        match self {
            Self::Gemini => Some(ProviderSettings {
                api_url: "https://generativelanguage.googleapis.com/v1beta",
                model: "gemini-2.5-flash",
                env_var: "GEMINI_API_KEY",
            }),
            Self::OpenAi => Some(ProviderSettings {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4o-mini",
                env_var: "OPENAI_API_KEY",
            }),
            Self::Groq => Some(ProviderSettings {
                api_url: "https://api.groq.com/openai/v1/chat/completions",
                model: "llama-3.1-8b-instant",
                env_var: "GROQ_API_KEY",
            }),
            Self::DeepSeek => Some(ProviderSettings {
                api_url: "https://api.deepseek.com/chat/completions",
                model: "deepseek-chat",
                env_var: "DEEPSEEK_API_KEY",
            }),
            Self::Auto | Self::Local => None,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "groq" => Ok(Self::Groq),
            "deepseek" => Ok(Self::DeepSeek),
            "local" | "none" => Ok(Self::Local),
            other => Err(format!("unknown scoring provider '{other}'")),
        }
    }
}

/// Configuration for the scoring provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// API key for `kind`; resolved from the provider's env var by `from_env`
    pub api_key: Option<String>,
    /// Override of the endpoint (tests, proxies)
    pub base_url: Option<String>,
    /// Override of the model name
    pub model: Option<String>,
    /// Client-side request budget
    pub requests_per_second: u32,
    /// HTTP client timeout
    pub http_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Local,
            api_key: None,
            base_url: None,
            model: None,
            requests_per_second: 2,
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let requested = std::env::var("MCLIP_SCORING_PROVIDER")
            .ok()
            .and_then(|s| match s.parse::<ProviderKind>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    warn!("{}; using auto", e);
                    None
                }
            })
            .unwrap_or_default();

        let (kind, api_key) = resolve_kind(requested, |var| std::env::var(var).ok());

        Self {
            kind,
            api_key,
            base_url: std::env::var("MCLIP_PROVIDER_BASE_URL").ok(),
            model: std::env::var("MCLIP_PROVIDER_MODEL").ok(),
            requests_per_second: std::env::var("MCLIP_PROVIDER_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            http_timeout: Duration::from_secs(
                std::env::var("MCLIP_PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Config for a specific remote provider and key.
    pub fn remote(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = rps;
        self
    }
}

/// Resolve `Auto` and look up the API key with `lookup`.
///
/// A remote provider without a key keeps its kind but has no key; selection
/// then falls back to local scoring.
pub fn resolve_kind(
    requested: ProviderKind,
    lookup: impl Fn(&str) -> Option<String>,
) -> (ProviderKind, Option<String>) {
    let key_for = |kind: ProviderKind| {
        kind.settings()
            .and_then(|s| lookup(s.env_var))
            .filter(|k| !k.trim().is_empty())
    };

    match requested {
        ProviderKind::Auto => ProviderKind::AUTO_ORDER
            .iter()
            .find_map(|kind| key_for(*kind).map(|key| (*kind, Some(key))))
            .unwrap_or((ProviderKind::Local, None)),
        ProviderKind::Local => (ProviderKind::Local, None),
        kind => (kind, key_for(kind)),
    }
}

/// Outcome of provider selection.
pub enum ProviderSelection {
    Remote(Arc<dyn ScoringProvider>),
    /// Use local heuristic scoring; `reason` explains why
    Local { reason: String },
}

impl std::fmt::Debug for ProviderSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(p) => f.debug_tuple("Remote").field(&p.name()).finish(),
            Self::Local { reason } => f.debug_struct("Local").field("reason", reason).finish(),
        }
    }
}

/// Build the configured provider.
pub fn select_provider(config: &ProviderConfig) -> ProviderResult<ProviderSelection> {
    let Some(settings) = config.kind.settings() else {
        info!(provider = "local", "Using local heuristic scoring");
        return Ok(ProviderSelection::Local {
            reason: "local scoring selected".to_string(),
        });
    };

    let Some(api_key) = config.api_key.clone() else {
        warn!(
            provider = config.kind.name(),
            env_var = settings.env_var,
            "API key not set, falling back to local scoring"
        );
        return Ok(ProviderSelection::Local {
            reason: format!("{} not set", settings.env_var),
        });
    };

    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| settings.api_url.to_string());
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| settings.model.to_string());

    let provider: Arc<dyn ScoringProvider> = match config.kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            api_key,
            base_url,
            model,
            config.http_timeout,
            config.requests_per_second,
        )?),
        kind => Arc::new(OpenAiCompatProvider::new(
            kind.name(),
            api_key,
            base_url,
            model,
            config.http_timeout,
            config.requests_per_second,
        )?),
    };

    info!(provider = provider.name(), "Using AI scoring provider");
    Ok(ProviderSelection::Remote(provider))
}

impl From<ProviderError> for ProviderSelection {
    fn from(e: ProviderError) -> Self {
        Self::Local {
            reason: format!("provider setup failed: {e}"),
        }
    }
}
