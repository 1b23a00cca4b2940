//! Opening-hook detection.

use std::sync::Arc;

use mclip_models::timestamp::TIME_EPSILON;
use mclip_models::{SignalHit, SignalKind, Transcript, Word};
use tracing::debug;

use super::taxonomy::{find_data, is_listicle, KeywordTaxonomy};
use super::tokens;

/// Cue count at which the hook score saturates.
pub const MAX_HOOK_CUES: usize = 3;

/// Penalty factor for openings that start on a filler word.
pub const VAGUE_START_FACTOR: f64 = 0.8;

const INTERROGATIVES: &[&str] = &[
    "what", "why", "how", "who", "when", "where", "which", "can", "could", "would", "should",
    "will", "did", "does", "do", "is", "are", "was", "were",
];

const DIRECT_ADDRESS: &[&str] = &["you", "your", "you're", "yourself"];

const VAGUE_STARTS: &[&str] = &["this", "that", "it", "so", "and", "but", "um", "uh"];

/// Hook strength of a word run.
#[derive(Debug, Clone, PartialEq)]
pub struct HookScore {
    /// Normalized strength in `[0, 1]`
    pub raw: f64,
    /// Matched cues, in detection order
    pub cues: Vec<String>,
}

impl HookScore {
    fn none() -> Self {
        Self {
            raw: 0.0,
            cues: Vec::new(),
        }
    }
}

/// Scores question framing, direct address, hook phrases, number openers,
/// contrarian claims, urgency and emotional triggers.
#[derive(Debug, Clone)]
pub struct HookDetector {
    taxonomy: Arc<KeywordTaxonomy>,
    hook_window_secs: f64,
}

impl HookDetector {
    pub fn new(taxonomy: Arc<KeywordTaxonomy>, hook_window_secs: f64) -> Self {
        Self {
            taxonomy,
            hook_window_secs,
        }
    }

    pub fn hook_window_secs(&self) -> f64 {
        self.hook_window_secs
    }

    pub fn taxonomy(&self) -> &KeywordTaxonomy {
        &self.taxonomy
    }

    /// One `hook` hit per segment with at least one cue.
    ///
    /// The hit covers the first `hook_window_secs` of the segment.
    pub fn detect(&self, transcript: &Transcript) -> Vec<SignalHit> {
        let words = transcript.words();
        let hits: Vec<SignalHit> = transcript
            .segments()
            .iter()
            .filter_map(|segment| {
                let score = self.score_words(&words[segment.first_word..=segment.last_word]);
                (score.raw > 0.0).then(|| {
                    let end = (segment.start + self.hook_window_secs).min(segment.end);
                    SignalHit::new(SignalKind::Hook, segment.start, end, score.raw)
                        .with_label(score.cues.join(", "))
                })
            })
            .collect();

        debug!(
            segments = transcript.segments().len(),
            hooks = hits.len(),
            "Hook detection complete"
        );
        hits
    }

    /// Hook strength of the words starting in `[start, start + window)`.
    pub fn score_opening(&self, transcript: &Transcript, start: f64, window: f64) -> HookScore {
        let words = transcript.words();
        let lo = words.partition_point(|w| w.start < start - TIME_EPSILON);
        let hi = words.partition_point(|w| w.start < start + window);
        if lo >= hi {
            return HookScore::none();
        }
        self.score_words(&words[lo..hi])
    }

    pub fn score_words(&self, words: &[Word]) -> HookScore {
        let tokens = tokens(words);
        let Some(first) = tokens.first() else {
            return HookScore::none();
        };

        let mut cues = Vec::new();
        if words.iter().any(|w| w.text.contains('?')) || INTERROGATIVES.contains(&first.as_str()) {
            cues.push("question".to_string());
        }
        if tokens.iter().any(|t| DIRECT_ADDRESS.contains(&t.as_str())) {
            cues.push("direct address".to_string());
        }
        cues.extend(self.taxonomy.hook_phrases_in(&tokens).cloned());
        if is_listicle(&tokens.join(" ")) {
            cues.push("listicle".to_string());
        } else if find_data(&tokens).is_some() {
            cues.push("number".to_string());
        }
        cues.extend(
            [
                self.taxonomy.contrarian_in(&tokens),
                self.taxonomy.urgency_in(&tokens),
                self.taxonomy.emotional_trigger_in(&tokens),
            ]
            .into_iter()
            .flatten()
            .cloned(),
        );

        let mut raw = cues.len().min(MAX_HOOK_CUES) as f64 / MAX_HOOK_CUES as f64;
        if VAGUE_STARTS.contains(&first.as_str()) {
            raw *= VAGUE_START_FACTOR;
        }

        HookScore { raw, cues }
    }
}
