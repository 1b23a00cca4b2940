//! Signal hits: the atomic evidence units produced by the analyzers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::{interval_gap, intervals_overlap};

/// Source of a signal hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Energy,
    Silence,
    Keyword,
    Hook,
    Statement,
}

impl SignalKind {
    pub const ALL: [SignalKind; 5] = [
        SignalKind::Energy,
        SignalKind::Silence,
        SignalKind::Keyword,
        SignalKind::Hook,
        SignalKind::Statement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Silence => "silence",
            Self::Keyword => "keyword",
            Self::Hook => "hook",
            Self::Statement => "statement",
        }
    }

    /// Lexical kinds come from transcript scanning.
    pub fn is_lexical(&self) -> bool {
        matches!(self, Self::Keyword | Self::Hook | Self::Statement)
    }

    /// Kinds that may seed a lexical-only candidate.
    pub fn seeds_candidates(&self) -> bool {
        matches!(self, Self::Energy | Self::Keyword | Self::Hook)
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword taxonomy category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCategory {
    Emotional,
    Action,
    Revelation,
    Data,
}

impl KeywordCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emotional => "emotional",
            Self::Action => "action",
            Self::Revelation => "revelation",
            Self::Data => "data",
        }
    }
}

/// A piece of evidence over `[start, end]` with a normalized score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignalHit {
    pub kind: SignalKind,
    pub start: f64,
    pub end: f64,
    pub raw_score: f64,

    /// Keyword category, for keyword hits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<KeywordCategory>,

    /// Matched term or cue, for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SignalHit {
    pub fn new(kind: SignalKind, start: f64, end: f64, raw_score: f64) -> Self {
        Self {
            kind,
            start,
            end,
            raw_score: raw_score.clamp(0.0, 1.0),
            category: None,
            label: None,
        }
    }

    pub fn keyword(category: KeywordCategory, start: f64, end: f64, raw_score: f64) -> Self {
        Self::new(SignalKind::Keyword, start, end, raw_score).with_category(category)
    }

    pub fn with_category(mut self, category: KeywordCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    /// True if the hit shares time with `[start, end]`, or is an instant inside it.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        if self.duration() <= 0.0 {
            return self.start >= start && self.start <= end;
        }
        intervals_overlap(self.start, self.end, start, end)
    }

    /// Distance from the hit to `[start, end]`; zero when touching.
    pub fn gap_to(&self, start: f64, end: f64) -> f64 {
        interval_gap(self.start, self.end, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_score_is_clamped() {
        assert_eq!(SignalHit::new(SignalKind::Energy, 0.0, 1.0, 1.7).raw_score, 1.0);
        assert_eq!(SignalHit::new(SignalKind::Energy, 0.0, 1.0, -0.2).raw_score, 0.0);
    }

    #[test]
    fn test_overlap_and_gap() {
        let hit = SignalHit::new(SignalKind::Keyword, 10.0, 10.5, 0.8);
        assert!(hit.overlaps(9.0, 10.2));
        assert!(!hit.overlaps(10.5, 12.0));
        assert_eq!(hit.gap_to(12.0, 14.0), 1.5);
        assert_eq!(hit.gap_to(0.0, 10.2), 0.0);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let hit = SignalHit::keyword(KeywordCategory::Revelation, 1.0, 2.0, 1.0).with_label("secret");
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["kind"], "keyword");
        assert_eq!(json["category"], "revelation");
        assert_eq!(json["label"], "secret");
    }
}
