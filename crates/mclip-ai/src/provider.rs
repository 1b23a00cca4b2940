//! The scoring capability trait.

use async_trait::async_trait;
use mclip_models::ScoreSource;

use crate::error::ProviderResult;
use crate::types::{ProviderScore, ScoringBatch};

/// Per-candidate outcome inside a successful batch call.
pub type CandidateScore = ProviderResult<ProviderScore>;

/// Anything that can score a batch of candidates.
///
/// The outer `Result` fails the whole batch (transport, auth, quota); the
/// inner results let a provider reject individual candidates. Implementations
/// return exactly one inner result per batch item, in batch order.
#[async_trait]
pub trait ScoringProvider: Send + Sync {
    /// Short provider name for logs and reports.
    fn name(&self) -> &str;

    /// Source recorded on moments this provider scores.
    fn source(&self) -> ScoreSource {
        ScoreSource::Ai
    }

    async fn score(&self, batch: &ScoringBatch) -> ProviderResult<Vec<CandidateScore>>;
}
