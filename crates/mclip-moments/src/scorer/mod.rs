//! Candidate scoring through a [`ScoringProvider`] with local fallback.
//!
//! Candidates are chunked into batches and sent to the provider with a
//! bounded number of batches in flight. Whatever the provider cannot score
//! (auth, quota, network exhaustion, timeout, malformed output) is scored
//! locally and reported as a [`ScoringWarning`]. Scoring never fails a run.

pub mod local;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::future::join_all;
use mclip_ai::{
    retry_if, CandidateScore, ProviderError, ProviderErrorKind, ProviderResult, ProviderScore, ProviderSelection,
    RetryConfig, ScoringBatch, ScoringItem, ScoringProvider,
};
use mclip_models::{CandidateMoment, ScoredMoment, SignalPolicy, Transcript};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::extractor::env_f64;

pub use local::{LocalProvider, LocalScorer};

/// Scorer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorerConfig {
    /// Candidates per provider request
    pub batch_size: usize,
    pub max_concurrent_batches: usize,
    pub request_timeout: Duration,
    /// Retries for network failures
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Transcript context on each side of a candidate
    pub context_padding_secs: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_concurrent_batches: 2,
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            context_padding_secs: 5.0,
        }
    }
}

impl ScorerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: std::env::var("MCLIP_SCORING_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.batch_size),
            max_concurrent_batches: std::env::var("MCLIP_SCORING_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_concurrent_batches),
            request_timeout: Duration::from_secs(
                std::env::var("MCLIP_SCORING_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("MCLIP_SCORING_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            context_padding_secs: env_f64("MCLIP_CONTEXT_PADDING_SECS", defaults.context_padding_secs),
            ..defaults
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_concurrent_batches(mut self, n: usize) -> Self {
        self.max_concurrent_batches = n;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    fn retry_config(&self, provider: &str) -> RetryConfig {
        RetryConfig::new(format!("{provider}_score"))
            .with_max_retries(self.max_retries)
            .with_base_delay(self.base_delay)
            .with_max_delay(self.max_delay)
    }
}

/// A candidate that fell back to local scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringWarning {
    pub start: f64,
    pub end: f64,
    pub kind: ProviderErrorKind,
    pub message: String,
}

/// Scored moments in input order plus every fallback taken.
#[derive(Debug, Clone, Default)]
pub struct ScoringOutcome {
    pub moments: Vec<ScoredMoment>,
    pub warnings: Vec<ScoringWarning>,
}

impl ScoringOutcome {
    pub fn fallback_count(&self) -> usize {
        self.warnings.len()
    }
}

/// Scores candidates with one provider chosen at construction.
pub struct MomentScorer {
    provider: Arc<dyn ScoringProvider>,
    local: LocalScorer,
    config: ScorerConfig,
}

impl MomentScorer {
    pub fn new(provider: Arc<dyn ScoringProvider>, local: LocalScorer, config: ScorerConfig) -> Self {
        Self {
            provider,
            local,
            config,
        }
    }

    /// Local heuristic scoring only.
    pub fn local(policy: SignalPolicy, config: ScorerConfig) -> Self {
        Self::new(Arc::new(LocalProvider::new(policy)), LocalScorer::new(policy), config)
    }

    pub fn from_selection(selection: ProviderSelection, policy: SignalPolicy, config: ScorerConfig) -> Self {
        match selection {
            ProviderSelection::Remote(provider) => Self::new(provider, LocalScorer::new(policy), config),
            ProviderSelection::Local { reason } => {
                debug!(reason = %reason, "Scoring locally");
                Self::local(policy, config)
            }
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    pub async fn score(&self, candidates: Vec<CandidateMoment>, transcript: &Transcript) -> ScoringOutcome {
        if candidates.is_empty() {
            return ScoringOutcome::default();
        }

        let pad = self.config.context_padding_secs;
        let items: Vec<ScoringItem> = candidates
            .iter()
            .enumerate()
            .map(|(id, c)| {
                ScoringItem::new(id, c.start, c.end, transcript.text_between(c.start - pad, c.end + pad))
                    .with_hits(c.contributing_hits.clone())
            })
            .collect();
        let batches: Vec<ScoringBatch> = items
            .chunks(self.config.batch_size.max(1))
            .map(|chunk| ScoringBatch::new(chunk.to_vec()))
            .collect();

        info!(
            provider = self.provider.name(),
            candidates = candidates.len(),
            batches = batches.len(),
            "Scoring candidates"
        );

        let semaphore = Semaphore::new(self.config.max_concurrent_batches.max(1));
        let disabled: OnceLock<ProviderError> = OnceLock::new();
        let retry = self.config.retry_config(self.provider.name());

        let responses = join_all(
            batches
                .iter()
                .map(|batch| self.score_batch(batch, &semaphore, &disabled, &retry)),
        )
        .await;

        let mut verdicts: Vec<Option<CandidateScore>> = vec![None; candidates.len()];
        for (batch, response) in batches.iter().zip(responses) {
            match response {
                Ok(scores) if scores.len() == batch.len() => {
                    for (item, score) in batch.items.iter().zip(scores) {
                        verdicts[item.id] = Some(score);
                    }
                }
                Ok(scores) => {
                    let err = ProviderError::malformed(format!(
                        "expected {} scores, got {}",
                        batch.len(),
                        scores.len()
                    ));
                    for item in &batch.items {
                        verdicts[item.id] = Some(Err(err.clone()));
                    }
                }
                Err(err) => {
                    for item in &batch.items {
                        verdicts[item.id] = Some(Err(err.clone()));
                    }
                }
            }
        }

        let source = self.provider.source();
        let mut outcome = ScoringOutcome::default();
        for (candidate, verdict) in candidates.into_iter().zip(verdicts) {
            let verdict = verdict
                .unwrap_or_else(|| Err(ProviderError::malformed("no score returned for candidate")))
                .and_then(|score| {
                    if score.composite_score.is_finite() {
                        Ok(score)
                    } else {
                        Err(ProviderError::malformed("non-finite composite score"))
                    }
                });

            match verdict {
                Ok(ProviderScore {
                    composite_score,
                    breakdown,
                }) => outcome
                    .moments
                    .push(ScoredMoment::new(candidate, composite_score, breakdown, source)),
                Err(err) => {
                    warn!(
                        provider = self.provider.name(),
                        kind = err.kind().as_str(),
                        start = candidate.start,
                        end = candidate.end,
                        error = %err,
                        "Falling back to local scoring"
                    );
                    outcome.warnings.push(ScoringWarning {
                        start: candidate.start,
                        end: candidate.end,
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                    outcome.moments.push(self.local.score(candidate));
                }
            }
        }

        if !outcome.warnings.is_empty() {
            warn!(
                provider = self.provider.name(),
                fallbacks = outcome.fallback_count(),
                total = outcome.moments.len(),
                "Some candidates were scored locally"
            );
        }
        outcome
    }

    async fn score_batch(
        &self,
        batch: &ScoringBatch,
        semaphore: &Semaphore,
        disabled: &OnceLock<ProviderError>,
        retry: &RetryConfig,
    ) -> ProviderResult<Vec<CandidateScore>> {
        let Ok(_permit) = semaphore.acquire().await else {
            return Err(ProviderError::network("scoring semaphore closed"));
        };

        if let Some(err) = disabled.get() {
            return Err(err.clone());
        }

        let provider = &self.provider;
        let timeout = self.config.request_timeout;
        let result = retry_if(
            retry,
            || async move {
                match tokio::time::timeout(timeout, provider.score(batch)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(timeout)),
                }
            },
            ProviderError::is_retryable,
        )
        .await
        .into_result();

        if let Err(err) = &result {
            if err.disables_provider() && disabled.set(err.clone()).is_ok() {
                warn!(
                    provider = provider.name(),
                    kind = err.kind().as_str(),
                    "Provider disabled for the rest of the run"
                );
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use mclip_models::{ScoreSource, SignalHit, SignalKind, Word};

    struct ScriptedProvider {
        calls: AtomicUsize,
        respond: Box<dyn Fn(usize, &ScoringBatch) -> ProviderResult<Vec<CandidateScore>> + Send + Sync>,
    }

    impl ScriptedProvider {
        fn new(
            respond: impl Fn(usize, &ScoringBatch) -> ProviderResult<Vec<CandidateScore>> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                respond: Box::new(respond),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScoringProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn score(&self, batch: &ScoringBatch) -> ProviderResult<Vec<CandidateScore>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            (self.respond)(call, batch)
        }
    }

    fn fixed(score: f64) -> CandidateScore {
        Ok(ProviderScore {
            composite_score: score,
            breakdown: [("engagement".to_string(), score)].into_iter().collect(),
        })
    }

    fn candidates(n: usize) -> Vec<CandidateMoment> {
        (0..n)
            .map(|i| {
                let start = i as f64 * 20.0;
                let hit = SignalHit::new(SignalKind::Energy, start, start + 2.0, 0.5);
                CandidateMoment::new(start, start + 15.0, vec![hit]).unwrap()
            })
            .collect()
    }

    fn transcript() -> Transcript {
        Transcript::new(vec![Word::new("hello", 0.0, 0.5), Word::new("there.", 0.6, 1.0)]).unwrap()
    }

    fn fast_config() -> ScorerConfig {
        ScorerConfig::default()
            .with_batch_size(2)
            .with_retries(2, Duration::from_millis(1), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_ai_scores_keep_input_order_and_clamp() {
        let provider = ScriptedProvider::new(|_, batch| {
            Ok(batch.items.iter().map(|item| fixed(item.id as f64 * 6.0)).collect())
        });
        let scorer = MomentScorer::new(provider, LocalScorer::default(), fast_config());

        let outcome = scorer.score(candidates(3), &transcript()).await;
        assert!(outcome.warnings.is_empty());
        let scores: Vec<f64> = outcome.moments.iter().map(|m| m.composite_score).collect();
        assert_eq!(scores, vec![0.0, 6.0, 10.0]);
        assert!(outcome.moments.iter().all(|m| m.score_source == ScoreSource::Ai));
        assert_eq!(outcome.moments[1].start(), 20.0);
    }

    #[tokio::test]
    async fn test_network_errors_are_retried() {
        let provider = ScriptedProvider::new(|call, batch| {
            if call == 0 {
                Err(ProviderError::network("connection reset"))
            } else {
                Ok(batch.items.iter().map(|_| fixed(7.0)).collect())
            }
        });
        let scorer = MomentScorer::new(provider.clone(), LocalScorer::default(), fast_config().with_batch_size(5));

        let outcome = scorer.score(candidates(2), &transcript()).await;
        assert_eq!(provider.calls(), 2);
        assert!(outcome.warnings.is_empty());
        assert!(outcome.moments.iter().all(|m| m.composite_score == 7.0));
    }

    #[tokio::test]
    async fn test_retry_exhaustion_falls_back() {
        let provider = ScriptedProvider::new(|_, _| Err(ProviderError::network("down")));
        let scorer = MomentScorer::new(provider.clone(), LocalScorer::default(), fast_config().with_batch_size(5));

        let outcome = scorer.score(candidates(2), &transcript()).await;
        assert_eq!(provider.calls(), 3);
        assert_eq!(outcome.fallback_count(), 2);
        assert!(outcome.moments.iter().all(|m| m.score_source == ScoreSource::Local));
        assert_eq!(outcome.warnings[0].kind, ProviderErrorKind::Network);
    }

    #[tokio::test]
    async fn test_auth_failure_disables_provider() {
        let provider = ScriptedProvider::new(|_, _| Err(ProviderError::auth("bad key")));
        let config = fast_config().with_max_concurrent_batches(1);
        let scorer = MomentScorer::new(provider.clone(), LocalScorer::default(), config);

        let outcome = scorer.score(candidates(6), &transcript()).await;
        assert_eq!(provider.calls(), 1);
        assert_eq!(outcome.moments.len(), 6);
        assert_eq!(outcome.fallback_count(), 6);
        assert!(outcome.warnings.iter().all(|w| w.kind == ProviderErrorKind::Auth));
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        struct Stalled;

        #[async_trait]
        impl ScoringProvider for Stalled {
            fn name(&self) -> &str {
                "stalled"
            }

            async fn score(&self, _batch: &ScoringBatch) -> ProviderResult<Vec<CandidateScore>> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Vec::new())
            }
        }

        let config = fast_config().with_request_timeout(Duration::from_millis(20));
        let scorer = MomentScorer::new(Arc::new(Stalled), LocalScorer::default(), config);

        let outcome = scorer.score(candidates(1), &transcript()).await;
        assert_eq!(outcome.warnings[0].kind, ProviderErrorKind::Timeout);
        assert_eq!(outcome.moments[0].score_source, ScoreSource::Local);
    }

    #[tokio::test]
    async fn test_wrong_result_count_is_malformed() {
        let provider = ScriptedProvider::new(|_, _| Ok(vec![fixed(5.0)]));
        let scorer = MomentScorer::new(provider, LocalScorer::default(), fast_config());

        let outcome = scorer.score(candidates(2), &transcript()).await;
        assert_eq!(outcome.fallback_count(), 2);
        assert!(outcome.warnings.iter().all(|w| w.kind == ProviderErrorKind::Malformed));
    }

    #[tokio::test]
    async fn test_non_finite_score_is_malformed() {
        let provider = ScriptedProvider::new(|_, batch| {
            Ok(batch
                .items
                .iter()
                .map(|item| if item.id == 0 { fixed(f64::NAN) } else { fixed(3.0) })
                .collect())
        });
        let scorer = MomentScorer::new(provider, LocalScorer::default(), fast_config());

        let outcome = scorer.score(candidates(2), &transcript()).await;
        assert_eq!(outcome.fallback_count(), 1);
        assert_eq!(outcome.moments[0].score_source, ScoreSource::Local);
        assert_eq!(outcome.moments[1].composite_score, 3.0);
    }

    #[tokio::test]
    async fn test_local_scorer_matches_local_provider() {
        let scorer = MomentScorer::local(SignalPolicy::default(), ScorerConfig::default());
        let input = candidates(3);
        let expected: Vec<ScoredMoment> = input.iter().cloned().map(|c| LocalScorer::default().score(c)).collect();

        let outcome = scorer.score(input, &transcript()).await;
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.moments, expected);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let scorer = MomentScorer::local(SignalPolicy::default(), ScorerConfig::default());
        let outcome = scorer.score(Vec::new(), &transcript()).await;
        assert!(outcome.moments.is_empty());
    }
}
