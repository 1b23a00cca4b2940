//! Deterministic local scoring from contributing hits.
//!
//! ```text
//! subscore_k = 10 × max(raw of hits of kind k)      (0 when absent)
//! composite  = Σ W_k · subscore_k / Σ W_k
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use mclip_ai::{CandidateScore, ProviderResult, ProviderScore, ScoringBatch, ScoringProvider};
use mclip_models::{CandidateMoment, ScoreSource, ScoredMoment, SignalHit, SignalKind, SignalPolicy};

/// Weighted-sum scorer over a [`SignalPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocalScorer {
    policy: SignalPolicy,
}

impl LocalScorer {
    pub fn new(policy: SignalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SignalPolicy {
        &self.policy
    }

    /// Per-kind subscores on a 0-10 scale, keyed by kind name.
    pub fn breakdown(&self, hits: &[SignalHit]) -> BTreeMap<String, f64> {
        SignalKind::ALL
            .iter()
            .map(|kind| {
                let best = hits
                    .iter()
                    .filter(|h| h.kind == *kind)
                    .map(|h| h.raw_score)
                    .fold(0.0, f64::max);
                (kind.as_str().to_string(), 10.0 * best)
            })
            .collect()
    }

    /// Weighted mean of a breakdown; zero when every weight is zero.
    pub fn composite(&self, breakdown: &BTreeMap<String, f64>) -> f64 {
        let total = self.policy.total_weight();
        if total <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = SignalKind::ALL
            .iter()
            .map(|kind| self.policy.kind_weight(*kind) * breakdown.get(kind.as_str()).copied().unwrap_or(0.0))
            .sum();
        (weighted / total).clamp(0.0, 10.0)
    }

    pub fn score_hits(&self, hits: &[SignalHit]) -> ProviderScore {
        let breakdown = self.breakdown(hits);
        ProviderScore {
            composite_score: self.composite(&breakdown),
            breakdown,
        }
    }

    pub fn score(&self, candidate: CandidateMoment) -> ScoredMoment {
        let ProviderScore {
            composite_score,
            breakdown,
        } = self.score_hits(&candidate.contributing_hits);
        ScoredMoment::new(candidate, composite_score, breakdown, ScoreSource::Local)
    }
}

/// The local scorer behind the provider interface.
///
/// Scores each item from the hits it carries; never fails a batch.
#[derive(Debug, Clone, Default)]
pub struct LocalProvider {
    scorer: LocalScorer,
}

impl LocalProvider {
    pub fn new(policy: SignalPolicy) -> Self {
        Self {
            scorer: LocalScorer::new(policy),
        }
    }
}

#[async_trait]
impl ScoringProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn source(&self) -> ScoreSource {
        ScoreSource::Local
    }

    async fn score(&self, batch: &ScoringBatch) -> ProviderResult<Vec<CandidateScore>> {
        Ok(batch
            .items
            .iter()
            .map(|item| Ok(self.scorer.score_hits(&item.hits)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mclip_ai::ScoringItem;
    use mclip_models::KeywordCategory;

    fn hits() -> Vec<SignalHit> {
        vec![
            SignalHit::new(SignalKind::Energy, 120.0, 126.0, 0.8),
            SignalHit::keyword(KeywordCategory::Emotional, 121.0, 121.5, 0.65),
            SignalHit::keyword(KeywordCategory::Revelation, 123.0, 123.5, 1.0),
        ]
    }

    #[test]
    fn test_breakdown_uses_strongest_hit_per_kind() {
        let breakdown = LocalScorer::default().breakdown(&hits());
        assert_eq!(breakdown.len(), SignalKind::ALL.len());
        assert_eq!(breakdown["energy"], 8.0);
        assert_eq!(breakdown["keyword"], 10.0);
        assert_eq!(breakdown["hook"], 0.0);
    }

    #[test]
    fn test_composite_formula() {
        // (0.30 * 8 + 0.35 * 10) / 1.0
        let score = LocalScorer::default().score_hits(&hits());
        assert!((score.composite_score - 5.9).abs() < 1e-9);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let scorer = LocalScorer::default();
        let a = scorer.score_hits(&hits());
        let b = scorer.score_hits(&hits());
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_weight_on_one_kind() {
        let policy = SignalKind::ALL
            .iter()
            .fold(SignalPolicy::default(), |p, k| p.with_kind_weight(*k, 0.0))
            .with_kind_weight(SignalKind::Energy, 2.0);
        let score = LocalScorer::new(policy).score_hits(&hits());
        assert!((score.composite_score - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weights_score_zero() {
        let policy = SignalKind::ALL
            .iter()
            .fold(SignalPolicy::default(), |p, k| p.with_kind_weight(*k, 0.0));
        assert_eq!(LocalScorer::new(policy).score_hits(&hits()).composite_score, 0.0);
    }

    #[tokio::test]
    async fn test_local_provider_scores_from_item_hits() {
        let provider = LocalProvider::default();
        let batch = ScoringBatch::new(vec![
            ScoringItem::new(0, 120.0, 135.0, "").with_hits(hits()),
            ScoringItem::new(1, 200.0, 215.0, ""),
        ]);

        let results = provider.score(&batch).await.unwrap();
        assert_eq!(provider.source(), ScoreSource::Local);
        assert!((results[0].as_ref().unwrap().composite_score - 5.9).abs() < 1e-9);
        assert_eq!(results[1].as_ref().unwrap().composite_score, 0.0);
    }
}
