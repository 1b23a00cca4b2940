//! Signal weighting policy.
//!
//! One immutable table keyed by [`SignalKind`], shared by candidate
//! extraction, filtering and local scoring so the three never disagree.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::signal::{KeywordCategory, SignalHit, SignalKind};

/// Raw score assigned to keyword hits of each category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryWeights {
    pub revelation: f64,
    pub data: f64,
    pub action: f64,
    pub emotional: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            revelation: 1.0,
            data: 0.9,
            action: 0.8,
            emotional: 0.65,
        }
    }
}

/// Relative importance of each signal kind in the local composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignalPolicy {
    pub energy: f64,
    pub keyword: f64,
    pub hook: f64,
    pub statement: f64,
    pub silence: f64,
    pub categories: CategoryWeights,
}

impl Default for SignalPolicy {
    fn default() -> Self {
        Self {
            energy: 0.30,
            keyword: 0.35,
            hook: 0.25,
            statement: 0.05,
            silence: 0.05,
            categories: CategoryWeights::default(),
        }
    }
}

impl SignalPolicy {
    pub fn kind_weight(&self, kind: SignalKind) -> f64 {
        match kind {
            SignalKind::Energy => self.energy,
            SignalKind::Keyword => self.keyword,
            SignalKind::Hook => self.hook,
            SignalKind::Statement => self.statement,
            SignalKind::Silence => self.silence,
        }
    }

    pub fn category_weight(&self, category: KeywordCategory) -> f64 {
        match category {
            KeywordCategory::Revelation => self.categories.revelation,
            KeywordCategory::Data => self.categories.data,
            KeywordCategory::Action => self.categories.action,
            KeywordCategory::Emotional => self.categories.emotional,
        }
    }

    /// Sum of all kind weights.
    pub fn total_weight(&self) -> f64 {
        SignalKind::ALL.iter().map(|k| self.kind_weight(*k)).sum()
    }

    /// Weighted strength of a single hit, used to rank evidence.
    pub fn hit_strength(&self, hit: &SignalHit) -> f64 {
        self.kind_weight(hit.kind) * hit.raw_score
    }

    /// Replace the weight of one kind; negative or non-finite values become zero.
    pub fn with_kind_weight(mut self, kind: SignalKind, weight: f64) -> Self {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        match kind {
            SignalKind::Energy => self.energy = weight,
            SignalKind::Keyword => self.keyword = weight,
            SignalKind::Hook => self.hook = weight,
            SignalKind::Statement => self.statement = weight,
            SignalKind::Silence => self.silence = weight,
        }
        self
    }

    pub fn with_categories(mut self, categories: CategoryWeights) -> Self {
        self.categories = categories;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((SignalPolicy::default().total_weight() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_revelation_and_data_outrank_emotional() {
        let policy = SignalPolicy::default();
        let emotional = policy.category_weight(KeywordCategory::Emotional);
        assert!(policy.category_weight(KeywordCategory::Revelation) > emotional);
        assert!(policy.category_weight(KeywordCategory::Data) > emotional);
    }

    #[test]
    fn test_with_kind_weight_rejects_negative() {
        let policy = SignalPolicy::default().with_kind_weight(SignalKind::Hook, -3.0);
        assert_eq!(policy.hook, 0.0);
    }
}
