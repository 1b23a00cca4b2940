//! Provider request/response types.

use std::collections::BTreeMap;

use mclip_models::SignalHit;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};

/// One candidate sent for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringItem {
    /// Position of the candidate in the scorer's input
    pub id: usize,
    pub start: f64,
    pub end: f64,
    /// Transcript text around and inside the interval
    pub context: String,
    /// Evidence behind the candidate; only local scoring reads it
    #[serde(default, skip_serializing)]
    pub hits: Vec<SignalHit>,
}

impl ScoringItem {
    pub fn new(id: usize, start: f64, end: f64, context: impl Into<String>) -> Self {
        Self {
            id,
            start,
            end,
            context: context.into(),
            hits: Vec::new(),
        }
    }

    pub fn with_hits(mut self, hits: Vec<SignalHit>) -> Self {
        self.hits = hits;
        self
    }
}

/// A batch of candidates scored in one provider call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringBatch {
    pub items: Vec<ScoringItem>,
}

impl ScoringBatch {
    pub fn new(items: Vec<ScoringItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Provider verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderScore {
    pub composite_score: f64,
    #[serde(default)]
    pub breakdown: BTreeMap<String, f64>,
}

/// JSON payload the models are asked to return.
#[derive(Debug, Deserialize)]
struct ScoresPayload {
    scores: Vec<ScoreEntry>,
}

#[derive(Debug, Deserialize)]
struct ScoreEntry {
    id: usize,
    #[serde(default)]
    composite_score: Option<f64>,
    #[serde(default)]
    breakdown: BTreeMap<String, f64>,
}

/// Strip a surrounding markdown code fence, if any.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Parse model output into one result per batch item, in batch order.
///
/// Items the model skipped, or scored with a non-finite composite, come back
/// as `Malformed` so only those candidates fall back.
pub(crate) fn parse_scores(
    text: &str,
    batch: &ScoringBatch,
) -> ProviderResult<Vec<ProviderResult<ProviderScore>>> {
    let payload: ScoresPayload = serde_json::from_str(strip_code_fence(text))?;

    let mut by_id: BTreeMap<usize, ScoreEntry> = BTreeMap::new();
    for entry in payload.scores {
        by_id.entry(entry.id).or_insert(entry);
    }

    Ok(batch
        .items
        .iter()
        .map(|item| {
            let entry = by_id
                .remove(&item.id)
                .ok_or_else(|| ProviderError::malformed(format!("no score for candidate {}", item.id)))?;
            match entry.composite_score {
                Some(score) if score.is_finite() => Ok(ProviderScore {
                    composite_score: score,
                    breakdown: entry.breakdown,
                }),
                _ => Err(ProviderError::malformed(format!(
                    "invalid composite score for candidate {}",
                    item.id
                ))),
            }
        })
        .collect())
}
