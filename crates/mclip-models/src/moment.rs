//! Candidate, scored and selected moments.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::signal::{SignalHit, SignalKind};
use crate::timestamp::intervals_overlap;

/// Interval edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Start,
    End,
}

/// Repair applied to a candidate by the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FilterNote {
    /// Edge moved onto a word boundary
    Snapped { edge: Edge, from: f64, to: f64 },
    /// Edge pulled in to respect the maximum length
    Trimmed { edge: Edge, from: f64, to: f64 },
    /// Hits no longer inside the interval were removed
    HitsPruned { count: usize },
}

/// Why the filter rejected a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    Unalignable,
    TooShort,
    TooLong,
    WeakHook,
    OutOfBounds,
    /// Opening never states a topic or problem
    NoClearTopic,
    /// Opening continues a thought from before the clip
    MidThought,
    /// Opening leans on a pronoun with nothing to refer to
    UnclearPronoun,
    /// Explanation with no question or problem stated
    BareExplanation,
    /// Refers back to something said outside the clip
    ContextDependent,
    /// Refers to the show, episode or guest
    ShowReference,
    /// Call to subscribe or follow before any insight
    BrandingFirst,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unalignable => "unalignable",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::WeakHook => "weak_hook",
            Self::OutOfBounds => "out_of_bounds",
            Self::NoClearTopic => "no_clear_topic",
            Self::MidThought => "mid_thought",
            Self::UnclearPronoun => "unclear_pronoun",
            Self::BareExplanation => "bare_explanation",
            Self::ContextDependent => "context_dependent",
            Self::ShowReference => "show_reference",
            Self::BrandingFirst => "branding_first",
        }
    }
}

/// A provisional clip interval with the evidence that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CandidateMoment {
    pub start: f64,
    pub end: f64,
    pub contributing_hits: Vec<SignalHit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<FilterNote>,
}

impl CandidateMoment {
    /// Create a candidate; requires `0 <= start < end`.
    pub fn new(start: f64, end: f64, contributing_hits: Vec<SignalHit>) -> ModelResult<Self> {
        if !(start >= 0.0 && start < end && end.is_finite()) {
            return Err(ModelError::InvalidInterval { start, end });
        }
        Ok(Self {
            start,
            end,
            contributing_hits,
            history: Vec::new(),
        })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &CandidateMoment) -> bool {
        intervals_overlap(self.start, self.end, other.start, other.end)
    }

    pub fn has_kind(&self, kind: SignalKind) -> bool {
        self.contributing_hits.iter().any(|h| h.kind == kind)
    }

    pub fn hits_of(&self, kind: SignalKind) -> impl Iterator<Item = &SignalHit> {
        self.contributing_hits.iter().filter(move |h| h.kind == kind)
    }

    /// Highest raw score among hits of `kind`, zero if none.
    pub fn max_raw(&self, kind: SignalKind) -> f64 {
        self.hits_of(kind).map(|h| h.raw_score).fold(0.0, f64::max)
    }

    /// Add a hit unless an identical one is already present.
    pub fn add_hit(&mut self, hit: SignalHit) {
        if !self.contributing_hits.contains(&hit) {
            self.contributing_hits.push(hit);
        }
    }
}

/// A candidate dropped by the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DroppedCandidate {
    pub start: f64,
    pub end: f64,
    pub reason: DropReason,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<FilterNote>,
}

/// Origin of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Ai,
    Local,
}

impl ScoreSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Local => "local",
        }
    }
}

/// A candidate with its composite score and per-criterion breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoredMoment {
    #[serde(flatten)]
    pub moment: CandidateMoment,
    pub composite_score: f64,
    pub breakdown: BTreeMap<String, f64>,
    pub score_source: ScoreSource,
}

impl ScoredMoment {
    /// Wrap a candidate; the composite is clamped to `[0, 10]`.
    pub fn new(
        moment: CandidateMoment,
        composite_score: f64,
        breakdown: BTreeMap<String, f64>,
        score_source: ScoreSource,
    ) -> Self {
        Self {
            moment,
            composite_score: composite_score.clamp(0.0, 10.0),
            breakdown,
            score_source,
        }
    }

    pub fn start(&self) -> f64 {
        self.moment.start
    }

    pub fn end(&self) -> f64 {
        self.moment.end
    }

    pub fn duration(&self) -> f64 {
        self.moment.duration()
    }

    pub fn overlaps(&self, other: &ScoredMoment) -> bool {
        self.moment.overlaps(&other.moment)
    }
}

/// Returned alongside a selection that could not reach its target count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SelectionShortfall {
    pub requested: usize,
    pub returned: usize,
}

/// Final non-overlapping moments, highest score first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectionResult {
    pub moments: Vec<ScoredMoment>,
    pub requested: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<SelectionShortfall>,
}

impl SelectionResult {
    pub fn is_degraded(&self) -> bool {
        self.shortfall.is_some()
    }

    /// Moments in timestamp order.
    pub fn by_time(&self) -> Vec<&ScoredMoment> {
        let mut ordered: Vec<&ScoredMoment> = self.moments.iter().collect();
        ordered.sort_by(|a, b| a.start().total_cmp(&b.start()));
        ordered
    }
}
