//! Candidate filtering: word-boundary snapping, length repair, weak-hook
//! rejection and content rules.
//!
//! Every candidate either survives with a history of the repairs applied to
//! it, or is dropped with a reason. A bad candidate never fails the run.
//!
//! Content rules drop clips a viewer cannot follow on their own, checked in
//! order:
//! 1. the opening states no topic or problem
//! 2. the clip starts mid-thought ("so we...", "because...")
//! 3. the first sentence opens on an unanchored pronoun
//! 4. the clip is a bare explanation with no question or problem
//! 5. the clip refers back to earlier material
//! 6. the clip refers to the show, episode or guest
//! 7. the first sentence is a call to subscribe or follow

use std::str::FromStr;

use mclip_models::timestamp::TIME_EPSILON;
use mclip_models::{
    CandidateMoment, DropReason, DroppedCandidate, Edge, FilterNote, SignalHit, SignalKind, SignalPolicy, Transcript,
    Word,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aligner::{Direction, WordAligner};
use crate::extractor::env_f64;
use crate::lexical::taxonomy::{self, FILLER_WORDS, UNCLEAR_PRONOUNS};
use crate::lexical::{tokens, HookDetector};

/// Fewer opening words than this widens the topic window to twice its length.
const MIN_OPENING_WORDS: usize = 3;

/// A pronoun among this many leading words of the first sentence is unanchored.
const PRONOUN_REACH: usize = 3;

/// Which edge to pull in when a candidate is longer than `max_length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimPolicy {
    /// Trim the edge farther from the strongest contributing hit
    #[default]
    FarthestFromStrongest,
    /// Always trim the end
    KeepStart,
    /// Always trim the start
    KeepEnd,
}

impl FromStr for TrimPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "farthest_from_strongest" | "strongest" => Ok(Self::FarthestFromStrongest),
            "keep_start" => Ok(Self::KeepStart),
            "keep_end" => Ok(Self::KeepEnd),
            other => Err(format!("unknown trim policy '{other}'")),
        }
    }
}

/// Filter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub min_length: f64,
    pub max_length: f64,
    /// Hook contribution below this floor drops candidates without energy
    pub weak_hook_floor: f64,
    /// Opening span scored for hook strength
    pub hook_window_secs: f64,
    /// How far a trimmed edge may move to find a word boundary
    pub trim_search_secs: f64,
    pub trim_policy: TrimPolicy,
    /// Opening span that must state a topic or problem
    pub topic_window_secs: f64,
    /// Apply the content rules after the structural checks
    pub content_rules: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_length: 15.0,
            max_length: 60.0,
            weak_hook_floor: 0.34,
            hook_window_secs: 3.0,
            trim_search_secs: 5.0,
            trim_policy: TrimPolicy::default(),
            topic_window_secs: 2.0,
            content_rules: true,
        }
    }
}

impl FilterConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_length: env_f64("MCLIP_MIN_LENGTH_SECS", defaults.min_length),
            max_length: env_f64("MCLIP_MAX_LENGTH_SECS", defaults.max_length),
            weak_hook_floor: env_f64("MCLIP_WEAK_HOOK_FLOOR", defaults.weak_hook_floor),
            hook_window_secs: env_f64("MCLIP_HOOK_WINDOW_SECS", defaults.hook_window_secs),
            trim_search_secs: env_f64("MCLIP_TRIM_SEARCH_SECS", defaults.trim_search_secs),
            trim_policy: std::env::var("MCLIP_TRIM_POLICY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            topic_window_secs: env_f64("MCLIP_TOPIC_WINDOW_SECS", defaults.topic_window_secs),
            content_rules: std::env::var("MCLIP_CONTENT_RULES")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.content_rules),
        }
    }

    pub fn with_lengths(mut self, min_length: f64, max_length: f64) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    pub fn with_weak_hook_floor(mut self, floor: f64) -> Self {
        self.weak_hook_floor = floor;
        self
    }

    pub fn with_trim_policy(mut self, policy: TrimPolicy) -> Self {
        self.trim_policy = policy;
        self
    }

    pub fn with_content_rules(mut self, enabled: bool) -> Self {
        self.content_rules = enabled;
        self
    }
}

/// Survivors and drops of one filter pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOutcome {
    pub survivors: Vec<CandidateMoment>,
    pub dropped: Vec<DroppedCandidate>,
}

impl FilterOutcome {
    pub fn dropped_for(&self, reason: DropReason) -> usize {
        self.dropped.iter().filter(|d| d.reason == reason).count()
    }
}

/// Inputs shared by every candidate in one pass.
pub struct FilterContext<'a> {
    pub transcript: &'a Transcript,
    pub aligner: &'a WordAligner,
    pub hooks: &'a HookDetector,
    pub duration: f64,
}

/// Applies snapping, trimming and drop rules.
#[derive(Debug, Clone, Default)]
pub struct MomentFilter {
    config: FilterConfig,
    policy: SignalPolicy,
}

/// In-progress candidate state.
struct Working {
    start: f64,
    end: f64,
    hits: Vec<SignalHit>,
    history: Vec<FilterNote>,
}

impl Working {
    fn reject(self, reason: DropReason) -> Result<CandidateMoment, DroppedCandidate> {
        Err(DroppedCandidate {
            start: self.start,
            end: self.end,
            reason,
            history: self.history,
        })
    }
}

impl MomentFilter {
    pub fn new(config: FilterConfig, policy: SignalPolicy) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn apply(&self, candidates: Vec<CandidateMoment>, ctx: &FilterContext<'_>) -> FilterOutcome {
        let total = candidates.len();
        let mut outcome = FilterOutcome::default();
        let boundaries = ctx.transcript.sentence_boundaries();

        for candidate in candidates {
            match self.check(candidate, ctx, &boundaries) {
                Ok(survivor) => outcome.survivors.push(survivor),
                Err(dropped) => {
                    debug!(
                        start = dropped.start,
                        end = dropped.end,
                        reason = dropped.reason.as_str(),
                        "Dropped candidate"
                    );
                    outcome.dropped.push(dropped);
                }
            }
        }

        info!(
            candidates = total,
            survivors = outcome.survivors.len(),
            dropped = outcome.dropped.len(),
            "Filtering complete"
        );
        outcome
    }

    fn check(
        &self,
        candidate: CandidateMoment,
        ctx: &FilterContext<'_>,
        boundaries: &[f64],
    ) -> Result<CandidateMoment, DroppedCandidate> {
        let mut w = Working {
            start: candidate.start,
            end: candidate.end,
            hits: candidate.contributing_hits,
            history: candidate.history,
        };

        let start = ctx
            .aligner
            .nearest_word_start(w.start, Direction::Before)
            .or_else(|_| ctx.aligner.nearest_word_start(w.start, Direction::After));
        let end = ctx
            .aligner
            .nearest_word_end(w.end, Direction::After)
            .or_else(|_| ctx.aligner.nearest_word_end(w.end, Direction::Before));
        let (Ok(start), Ok(end)) = (start, end) else {
            return w.reject(DropReason::Unalignable);
        };
        if start.time >= end.time {
            return w.reject(DropReason::Unalignable);
        }
        note_move(&mut w.history, Edge::Start, w.start, start.time, true);
        note_move(&mut w.history, Edge::End, w.end, end.time, true);
        w.start = start.time;
        w.end = end.time;

        if w.end > ctx.duration + TIME_EPSILON {
            return w.reject(DropReason::OutOfBounds);
        }

        if w.end - w.start > self.config.max_length + TIME_EPSILON && !self.trim(&mut w, ctx.aligner) {
            return w.reject(DropReason::TooLong);
        }

        let length = w.end - w.start;
        if length < self.config.min_length - TIME_EPSILON {
            return w.reject(DropReason::TooShort);
        }
        if length > self.config.max_length + TIME_EPSILON {
            return w.reject(DropReason::TooLong);
        }

        let before = w.hits.len();
        let (start, end) = (w.start, w.end);
        w.hits.retain(|h| h.gap_to(start, end) <= TIME_EPSILON);
        let pruned = before - w.hits.len();
        if pruned > 0 {
            w.history.push(FilterNote::HitsPruned { count: pruned });
        }

        let opening = ctx
            .hooks
            .score_opening(ctx.transcript, w.start, self.config.hook_window_secs)
            .raw;
        let contributing_hook = w
            .hits
            .iter()
            .filter(|h| h.kind == SignalKind::Hook)
            .map(|h| h.raw_score)
            .fold(0.0, f64::max);
        let has_energy = w.hits.iter().any(|h| h.kind == SignalKind::Energy);
        if opening.max(contributing_hook) < self.config.weak_hook_floor && !has_energy {
            return w.reject(DropReason::WeakHook);
        }

        if self.config.content_rules {
            if let Some(reason) = self.content_rejection(ctx, boundaries, w.start, w.end) {
                return w.reject(reason);
            }
        }

        let mut survivor = match CandidateMoment::new(w.start, w.end, w.hits) {
            Ok(c) => c,
            Err(_) => {
                return Err(DroppedCandidate {
                    start: w.start,
                    end: w.end,
                    reason: DropReason::Unalignable,
                    history: w.history,
                })
            }
        };
        survivor.history = w.history;
        Ok(survivor)
    }

    /// First content rule broken by `[start, end]`, if any.
    fn content_rejection(
        &self,
        ctx: &FilterContext<'_>,
        boundaries: &[f64],
        start: f64,
        end: f64,
    ) -> Option<DropReason> {
        let terms = ctx.hooks.taxonomy();
        let window = self.config.topic_window_secs;

        let mut opening = ctx.transcript.words_in_range(start, start + window);
        if opening.len() < MIN_OPENING_WORDS {
            opening = ctx.transcript.words_in_range(start, start + 2.0 * window);
        }
        let opening_tokens = tokens(opening);
        if !opening_states_topic(opening, &opening_tokens) {
            return Some(DropReason::NoClearTopic);
        }

        let body = ctx.transcript.words_in_range(start, end);
        let body_tokens = tokens(body);
        let body_joined = body_tokens.join(" ");
        if taxonomy::starts_mid_thought(&body_joined) {
            return Some(DropReason::MidThought);
        }

        let sentence_end = boundaries
            .get(boundaries.partition_point(|b| *b < start))
            .copied()
            .unwrap_or(end);
        let first_sentence = &body_tokens[..body.iter().take_while(|w| w.end <= sentence_end).count()];
        let opening_sentence = &first_sentence[..first_sentence.len().min(opening.len())];
        if opening_sentence
            .iter()
            .take(PRONOUN_REACH)
            .any(|t| UNCLEAR_PRONOUNS.contains(&t.as_str()))
        {
            return Some(DropReason::UnclearPronoun);
        }

        let asks = body.iter().any(|w| w.text.contains('?'));
        if !asks && !terms.names_problem(&body_tokens) && taxonomy::starts_bare_explanation(&body_joined) {
            return Some(DropReason::BareExplanation);
        }
        if terms.context_reference_in(&body_tokens).is_some() {
            return Some(DropReason::ContextDependent);
        }
        if terms.show_reference_in(&body_tokens).is_some() {
            return Some(DropReason::ShowReference);
        }
        if terms.branding_in(first_sentence).is_some() {
            return Some(DropReason::BrandingFirst);
        }
        None
    }

    /// Pull one edge in so the candidate fits `max_length`. Returns false if
    /// no word boundary is reachable.
    fn trim(&self, w: &mut Working, aligner: &WordAligner) -> bool {
        let trim_start = match self.config.trim_policy {
            TrimPolicy::KeepStart => false,
            TrimPolicy::KeepEnd => true,
            TrimPolicy::FarthestFromStrongest => match self.strongest(&w.hits) {
                Some(hit) => {
                    let centre = hit.center();
                    centre - w.start > w.end - centre
                }
                None => false,
            },
        };

        let window = self.config.trim_search_secs;
        if trim_start {
            let target = w.end - self.config.max_length;
            let Ok(boundary) = aligner.nearest_word_start_within(target, Direction::After, window) else {
                return false;
            };
            if boundary.time >= w.end {
                return false;
            }
            note_move(&mut w.history, Edge::Start, w.start, boundary.time, false);
            w.start = boundary.time;
        } else {
            let target = w.start + self.config.max_length;
            let Ok(boundary) = aligner.nearest_word_end_within(target, Direction::Before, window) else {
                return false;
            };
            if boundary.time <= w.start {
                return false;
            }
            note_move(&mut w.history, Edge::End, w.end, boundary.time, false);
            w.end = boundary.time;
        }
        true
    }

    /// Highest `weight × raw` hit; the earliest wins ties.
    fn strongest<'h>(&self, hits: &'h [SignalHit]) -> Option<&'h SignalHit> {
        hits.iter().fold(None, |best: Option<&SignalHit>, hit| match best {
            Some(b) if self.policy.hit_strength(b) >= self.policy.hit_strength(hit) => Some(b),
            _ => Some(hit),
        })
    }
}

/// A question, a number, a topic pattern, or at least two meaningful words.
fn opening_states_topic(words: &[Word], tokens: &[String]) -> bool {
    if words.iter().any(|w| w.text.contains('?')) || tokens.iter().any(|t| t.chars().any(|c| c.is_ascii_digit())) {
        return true;
    }
    let joined = tokens.join(" ");
    if taxonomy::states_topic(&joined) {
        return true;
    }
    let meaningful = tokens
        .iter()
        .filter(|t| t.len() > 2 && !FILLER_WORDS.contains(&t.as_str()))
        .count();
    joined.len() >= 10 && tokens.len() >= 3 && meaningful >= 2
}

fn note_move(history: &mut Vec<FilterNote>, edge: Edge, from: f64, to: f64, snapped: bool) {
    if (from - to).abs() <= TIME_EPSILON {
        return;
    }
    history.push(if snapped {
        FilterNote::Snapped { edge, from, to }
    } else {
        FilterNote::Trimmed { edge, from, to }
    });
}
