//! Transcript models.
//!
//! Words come from an external transcription step and are read-only to the
//! engine. Segments (sentence or utterance spans) are derived once on
//! construction and are the unit of lexical scanning.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Pause that always closes a segment.
pub const SEGMENT_PAUSE_SECS: f64 = 0.8;

/// Longest span a single segment may cover.
pub const MAX_SEGMENT_SECS: f64 = 30.0;

/// A timed word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Word {
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            confidence: 1.0,
        }
    }

    /// True if the word closes a sentence (`.`, `!` or `?`).
    pub fn ends_sentence(&self) -> bool {
        self.text
            .trim_end_matches(|c: char| c == '"' || c == '\'' || c == ')')
            .ends_with(['.', '!', '?'])
    }

    /// Lowercased text with surrounding punctuation removed.
    ///
    /// Inner apostrophes, `%` and decimal points survive so that
    /// "didn't" and "2.5%" stay intact.
    pub fn normalized(&self) -> String {
        self.text
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '%')
            .to_lowercase()
    }
}

/// A contiguous run of words forming one sentence or utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Index of the first word (inclusive).
    pub first_word: usize,
    /// Index of the last word (inclusive).
    pub last_word: usize,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn word_count(&self) -> usize {
        self.last_word - self.first_word + 1
    }
}

/// Ordered words plus derived segments.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    words: Vec<Word>,
    segments: Vec<Segment>,
}

impl Transcript {
    /// Validate word timing and derive segments.
    ///
    /// Words must have finite, non-negative times with `start <= end`, and be
    /// sorted by start.
    pub fn new(words: Vec<Word>) -> ModelResult<Self> {
        let mut previous = 0.0_f64;
        for (index, word) in words.iter().enumerate() {
            if !word.start.is_finite() || !word.end.is_finite() {
                return Err(ModelError::invalid_word(index, "non-finite timing"));
            }
            if word.start < 0.0 {
                return Err(ModelError::invalid_word(index, "negative start"));
            }
            if word.end < word.start {
                return Err(ModelError::invalid_word(index, "end precedes start"));
            }
            if word.start < previous {
                return Err(ModelError::UnorderedWords {
                    index,
                    start: word.start,
                    previous,
                });
            }
            previous = word.start;
        }

        let segments = derive_segments(&words);
        Ok(Self { words, segments })
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// End of the last word, or zero for an empty transcript.
    pub fn duration(&self) -> f64 {
        self.words.iter().map(|w| w.end).fold(0.0, f64::max)
    }

    /// Words fully contained in `[start, end]`.
    pub fn words_in_range(&self, start: f64, end: f64) -> &[Word] {
        let lo = self.words.partition_point(|w| w.start < start);
        let hi = self.words.partition_point(|w| w.start <= end);
        if lo >= hi {
            return &[];
        }
        let slice = &self.words[lo..hi];
        let keep = slice.iter().take_while(|w| w.end <= end).count();
        &slice[..keep]
    }

    /// Text of all words whose midpoint falls inside `[start, end]`.
    pub fn text_between(&self, start: f64, end: f64) -> String {
        self.words
            .iter()
            .filter(|w| {
                let mid = (w.start + w.end) / 2.0;
                mid >= start && mid <= end
            })
            .map(|w| w.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Word ends that close a sentence.
    pub fn sentence_boundaries(&self) -> Vec<f64> {
        self.words
            .iter()
            .filter(|w| w.ends_sentence())
            .map(|w| w.end)
            .collect()
    }
}

fn derive_segments(words: &[Word]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut first = 0usize;

    for (i, word) in words.iter().enumerate() {
        let is_last = i + 1 == words.len();
        let pause_follows = words
            .get(i + 1)
            .map(|next| next.start - word.end >= SEGMENT_PAUSE_SECS)
            .unwrap_or(false);
        let too_long = word.end - words[first].start >= MAX_SEGMENT_SECS;

        if is_last || word.ends_sentence() || pause_follows || too_long {
            let span = &words[first..=i];
            segments.push(Segment {
                start: span[0].start,
                end: word.end,
                text: span
                    .iter()
                    .map(|w| w.text.trim())
                    .collect::<Vec<_>>()
                    .join(" "),
                first_word: first,
                last_word: i,
            });
            first = i + 1;
        }
    }

    segments
}
