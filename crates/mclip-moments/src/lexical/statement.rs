//! Keyword category hits and statement strength.

use std::sync::Arc;

use mclip_models::{KeywordCategory, SignalHit, SignalKind, SignalPolicy, Transcript, Word};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::taxonomy::{find_data, KeywordTaxonomy};
use super::tokens;

/// Categories in emission order.
const CATEGORIES: [KeywordCategory; 4] = [
    KeywordCategory::Revelation,
    KeywordCategory::Data,
    KeywordCategory::Action,
    KeywordCategory::Emotional,
];

/// Segments at or above this strength emit a `statement` hit.
pub const DEFAULT_MIN_STATEMENT_STRENGTH: f64 = 0.5;

const EXAMPLE_MARKERS: &[&str] = &["for example", "such as", "including", "like when"];
const TRAILING_MARKERS: &[&str] = &["etc", "and so on", "or whatever", "or something"];
const PERSONAL_PRONOUNS: &[&str] = &["you", "we", "us", "your", "our"];

/// Per-factor statement strength, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatementStrength {
    pub length: f64,
    pub specificity: f64,
    pub completeness: f64,
    pub engagement: f64,
}

impl StatementStrength {
    pub const LENGTH_WEIGHT: f64 = 0.15;
    pub const SPECIFICITY_WEIGHT: f64 = 0.30;
    pub const COMPLETENESS_WEIGHT: f64 = 0.25;
    pub const ENGAGEMENT_WEIGHT: f64 = 0.30;

    pub fn total(&self) -> f64 {
        self.length * Self::LENGTH_WEIGHT
            + self.specificity * Self::SPECIFICITY_WEIGHT
            + self.completeness * Self::COMPLETENESS_WEIGHT
            + self.engagement * Self::ENGAGEMENT_WEIGHT
    }
}

/// Scans segments for keyword categories, numeric claims and strong statements.
#[derive(Debug, Clone)]
pub struct StatementAnalyzer {
    taxonomy: Arc<KeywordTaxonomy>,
    policy: SignalPolicy,
    min_strength: f64,
}

impl StatementAnalyzer {
    pub fn new(taxonomy: Arc<KeywordTaxonomy>, policy: SignalPolicy) -> Self {
        Self {
            taxonomy,
            policy,
            min_strength: DEFAULT_MIN_STATEMENT_STRENGTH,
        }
    }

    pub fn with_min_strength(mut self, min_strength: f64) -> Self {
        self.min_strength = min_strength;
        self
    }

    /// Keyword hits (one per matched category per segment) and statement hits.
    pub fn detect(&self, transcript: &Transcript) -> Vec<SignalHit> {
        let words = transcript.words();
        let mut hits = Vec::new();

        for segment in transcript.segments() {
            let seg_words = &words[segment.first_word..=segment.last_word];
            let seg_tokens = tokens(seg_words);

            for category in CATEGORIES {
                if let Some(m) = self.taxonomy.find_first(category, &seg_tokens) {
                    hits.push(
                        SignalHit::keyword(
                            category,
                            seg_words[m.first].start,
                            seg_words[m.last].end,
                            self.policy.category_weight(category),
                        )
                        .with_label(m.term),
                    );
                }
            }

            let strength = self.strength(seg_words).total();
            if strength >= self.min_strength {
                hits.push(SignalHit::new(
                    SignalKind::Statement,
                    segment.start,
                    segment.end,
                    strength,
                ));
            }
        }

        debug!(
            segments = transcript.segments().len(),
            hits = hits.len(),
            "Statement analysis complete"
        );
        hits
    }

    /// Strength factors for a word run.
    pub fn strength(&self, words: &[Word]) -> StatementStrength {
        let tokens = tokens(words);
        let count = tokens.len();
        if count == 0 {
            return StatementStrength {
                length: 0.0,
                specificity: 0.0,
                completeness: 0.0,
                engagement: 0.0,
            };
        }
        let joined = tokens.join(" ");

        let length = if count < 10 {
            count as f64 * 0.05
        } else if count <= 60 {
            (count as f64 / 50.0).min(1.0)
        } else {
            (1.0 - (count - 60) as f64 * 0.01).max(0.5)
        };

        let numbers = tokens
            .iter()
            .filter(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()))
            .count();
        let proper_nouns = words
            .iter()
            .skip(1)
            .filter(|w| w.text.chars().next().is_some_and(char::is_uppercase))
            .count();
        let long_words = tokens.iter().filter(|t| t.chars().count() >= 8).count();
        let has_example = EXAMPLE_MARKERS.iter().any(|m| contains_phrase(&joined, m));
        let has_data = find_data(&tokens).is_some();
        let specificity = ((numbers as f64 * 0.1).min(0.3)
            + if has_data { 0.1 } else { 0.0 }
            + (proper_nouns as f64 * 0.05).min(0.2)
            + (long_words as f64 * 0.03).min(0.2)
            + if has_example { 0.3 } else { 0.0 })
        .min(1.0);

        let ends_properly = words.last().is_some_and(|w| w.ends_sentence());
        let trails_off = TRAILING_MARKERS.iter().any(|m| joined.ends_with(m));
        let completeness = if ends_properly { 0.5 } else { 0.0 }
            + if trails_off { 0.0 } else { 0.3 }
            + if count >= 3 { 0.2 } else { 0.0 };

        let unique = {
            let mut sorted = tokens.clone();
            sorted.sort();
            sorted.dedup();
            sorted.len()
        };
        let categories_hit = [
            KeywordCategory::Emotional,
            KeywordCategory::Action,
            KeywordCategory::Revelation,
        ]
        .into_iter()
        .filter(|c| self.taxonomy.find_first(*c, &tokens).is_some())
        .count();
        let engagement = ((unique as f64 / count as f64 * 0.5).min(0.3)
            + (categories_hit as f64 * 0.1).min(0.2)
            + if words.iter().any(|w| w.text.contains('?')) { 0.2 } else { 0.0 }
            + if tokens.iter().any(|t| PERSONAL_PRONOUNS.contains(&t.as_str())) {
                0.3
            } else {
                0.0
            })
        .min(1.0);

        StatementStrength {
            length,
            specificity,
            completeness,
            engagement,
        }
    }
}

fn contains_phrase(joined: &str, phrase: &str) -> bool {
    format!(" {joined} ").contains(&format!(" {phrase} "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> StatementAnalyzer {
        StatementAnalyzer::new(Arc::new(KeywordTaxonomy::default()), SignalPolicy::default())
    }

    fn transcript(text: &str) -> Transcript {
        let words = text
            .split_whitespace()
            .enumerate()
            .map(|(i, t)| Word::new(t, i as f64 * 0.5, i as f64 * 0.5 + 0.4))
            .collect();
        Transcript::new(words).unwrap()
    }

    #[test]
    fn test_category_hits_carry_policy_weight() {
        let hits = analyzer().detect(&transcript("The secret is that revenue grew 40% and it was shocking."));
        let keyword: Vec<&SignalHit> = hits.iter().filter(|h| h.kind == SignalKind::Keyword).collect();

        assert_eq!(keyword.len(), 3);
        assert_eq!(keyword[0].category, Some(KeywordCategory::Revelation));
        assert_eq!(keyword[0].raw_score, 1.0);
        assert_eq!(keyword[0].start, 0.5);
        assert_eq!(keyword[1].category, Some(KeywordCategory::Data));
        assert_eq!(keyword[1].label.as_deref(), Some("40%"));
        assert_eq!(keyword[1].raw_score, 0.9);
        assert_eq!(keyword[2].category, Some(KeywordCategory::Emotional));
        assert_eq!(keyword[2].raw_score, 0.65);
    }

    #[test]
    fn test_one_hit_per_category_per_segment() {
        let hits = analyzer().detect(&transcript("Wow, crazy, insane, amazing."));
        assert_eq!(hits.iter().filter(|h| h.kind == SignalKind::Keyword).count(), 1);
    }

    #[test]
    fn test_statement_hit_for_strong_segment() {
        let text = "Did you know that 73% of founders we surveyed in California \
                    actually failed because of cash flow, for example running out of runway?";
        let hits = analyzer().detect(&transcript(text));
        let statement = hits.iter().find(|h| h.kind == SignalKind::Statement).unwrap();
        assert!(statement.raw_score >= DEFAULT_MIN_STATEMENT_STRENGTH);
    }

    #[test]
    fn test_fragment_is_weak() {
        let words = vec![Word::new("um", 0.0, 0.2), Word::new("yeah", 0.3, 0.5)];
        let strength = analyzer().strength(&words);
        assert!(strength.total() < DEFAULT_MIN_STATEMENT_STRENGTH);
        assert_eq!(strength.completeness, 0.3);
    }
}
