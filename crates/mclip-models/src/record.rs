//! Exchanged moment record.
//!
//! The ordered list of records is the artifact consumed by reporting and by
//! clip assembly. Field names are camelCase on the wire.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::moment::{ScoreSource, ScoredMoment};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MomentRecord {
    pub start: f64,
    pub end: f64,
    pub composite_score: f64,
    pub breakdown: BTreeMap<String, f64>,
    pub score_source: ScoreSource,
}

impl MomentRecord {
    /// Check the record invariants: `start < end` and a score in `[0, 10]`.
    pub fn validate(&self) -> ModelResult<()> {
        if !(self.start < self.end) {
            return Err(ModelError::InvalidInterval {
                start: self.start,
                end: self.end,
            });
        }
        if !(0.0..=10.0).contains(&self.composite_score) {
            return Err(ModelError::ScoreOutOfRange(self.composite_score));
        }
        Ok(())
    }
}

impl From<&ScoredMoment> for MomentRecord {
    fn from(scored: &ScoredMoment) -> Self {
        Self {
            start: scored.start(),
            end: scored.end(),
            composite_score: scored.composite_score.clamp(0.0, 10.0),
            breakdown: scored.breakdown.clone(),
            score_source: scored.score_source,
        }
    }
}
