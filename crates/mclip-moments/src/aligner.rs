//! Word boundary lookups over a transcript.
//!
//! Candidate edges are snapped onto word starts and ends so clips never
//! begin or end mid-word. Lookups are binary searches over sorted boundary
//! lists built once per transcript.

use mclip_models::timestamp::TIME_EPSILON;
use mclip_models::{Edge, Transcript};
use serde::{Deserialize, Serialize};

use crate::error::{BoundaryError, BoundaryResult};

/// Aligner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignerConfig {
    /// Boundaries farther than this from the timestamp are ignored
    pub max_search_secs: f64,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            max_search_secs: 0.5,
        }
    }
}

impl AlignerConfig {
    pub fn from_env() -> Self {
        Self {
            max_search_secs: std::env::var("MCLIP_ALIGN_MAX_SEARCH_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.5),
        }
    }

    pub fn with_max_search_secs(mut self, secs: f64) -> Self {
        self.max_search_secs = secs;
        self
    }
}

/// Search direction relative to the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Boundaries at or before the timestamp
    Before,
    /// Boundaries at or after the timestamp
    After,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// A word start or end found by a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WordBoundary {
    pub time: f64,
    pub edge: Edge,
    pub word_index: usize,
}

impl WordBoundary {
    pub fn distance_to(&self, timestamp: f64) -> f64 {
        (self.time - timestamp).abs()
    }
}

/// Nearest-boundary lookups for one transcript.
#[derive(Debug, Clone)]
pub struct WordAligner {
    config: AlignerConfig,
    /// (start, word index), sorted by start
    starts: Vec<(f64, usize)>,
    /// (end, word index), sorted by end
    ends: Vec<(f64, usize)>,
}

impl WordAligner {
    pub fn new(transcript: &Transcript, config: AlignerConfig) -> Self {
        let words = transcript.words();
        let starts: Vec<(f64, usize)> = words.iter().enumerate().map(|(i, w)| (w.start, i)).collect();
        let mut ends: Vec<(f64, usize)> = words.iter().enumerate().map(|(i, w)| (w.end, i)).collect();
        ends.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        Self {
            config,
            starts,
            ends,
        }
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Nearest word start in `direction` within the configured window.
    pub fn nearest_word_start(&self, timestamp: f64, direction: Direction) -> BoundaryResult<WordBoundary> {
        self.nearest_word_start_within(timestamp, direction, self.config.max_search_secs)
    }

    /// Nearest word end in `direction` within the configured window.
    pub fn nearest_word_end(&self, timestamp: f64, direction: Direction) -> BoundaryResult<WordBoundary> {
        self.nearest_word_end_within(timestamp, direction, self.config.max_search_secs)
    }

    /// Closest word start or end in `direction`; a start wins an exact tie.
    pub fn nearest_word_boundary(&self, timestamp: f64, direction: Direction) -> BoundaryResult<WordBoundary> {
        let start = self.nearest_word_start(timestamp, direction);
        let end = self.nearest_word_end(timestamp, direction);

        match (start, end) {
            (Ok(s), Ok(e)) => {
                if e.distance_to(timestamp) < s.distance_to(timestamp) {
                    Ok(e)
                } else {
                    Ok(s)
                }
            }
            (Ok(s), Err(_)) => Ok(s),
            (Err(_), Ok(e)) => Ok(e),
            (Err(e), Err(_)) => Err(match e {
                BoundaryError::NotFound { .. } => BoundaryError::not_found(
                    "boundary",
                    timestamp,
                    direction,
                    self.config.max_search_secs,
                ),
                other => other,
            }),
        }
    }

    pub fn nearest_word_start_within(
        &self,
        timestamp: f64,
        direction: Direction,
        window: f64,
    ) -> BoundaryResult<WordBoundary> {
        lookup(&self.starts, timestamp, direction, window)
            .map(|(time, word_index)| WordBoundary {
                time,
                edge: Edge::Start,
                word_index,
            })
            .ok_or_else(|| self.miss("start", timestamp, direction, window))
    }

    pub fn nearest_word_end_within(
        &self,
        timestamp: f64,
        direction: Direction,
        window: f64,
    ) -> BoundaryResult<WordBoundary> {
        lookup(&self.ends, timestamp, direction, window)
            .map(|(time, word_index)| WordBoundary {
                time,
                edge: Edge::End,
                word_index,
            })
            .ok_or_else(|| self.miss("end", timestamp, direction, window))
    }

    fn miss(&self, what: &'static str, timestamp: f64, direction: Direction, window: f64) -> BoundaryError {
        if self.is_empty() {
            BoundaryError::EmptyTranscript
        } else {
            BoundaryError::not_found(what, timestamp, direction, window)
        }
    }
}

fn lookup(boundaries: &[(f64, usize)], timestamp: f64, direction: Direction, window: f64) -> Option<(f64, usize)> {
    let found = match direction {
        Direction::Before => {
            let idx = boundaries.partition_point(|(t, _)| *t <= timestamp + TIME_EPSILON);
            idx.checked_sub(1).map(|i| boundaries[i])
        }
        Direction::After => {
            let idx = boundaries.partition_point(|(t, _)| *t < timestamp - TIME_EPSILON);
            boundaries.get(idx).copied()
        }
    }?;

    ((found.0 - timestamp).abs() <= window + TIME_EPSILON).then_some(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mclip_models::Word;

    fn aligner() -> WordAligner {
        let transcript = Transcript::new(vec![
            Word::new("So", 10.1, 10.25),
            Word::new("here", 10.4, 10.7),
            Word::new("it", 10.75, 10.9),
            Word::new("is.", 39.9, 40.4),
        ])
        .unwrap();
        WordAligner::new(&transcript, AlignerConfig::default())
    }

    #[test]
    fn test_start_before_and_after() {
        let a = aligner();
        let before = a.nearest_word_start(10.3, Direction::Before).unwrap();
        assert_eq!(before.time, 10.1);
        assert_eq!(before.edge, Edge::Start);
        assert_eq!(before.word_index, 0);

        let after = a.nearest_word_start(10.3, Direction::After).unwrap();
        assert_eq!(after.time, 10.4);
        assert_eq!(after.word_index, 1);
    }

    #[test]
    fn test_end_after_snaps_forward() {
        let a = aligner();
        let end = a.nearest_word_end(40.1, Direction::After).unwrap();
        assert_eq!(end.time, 40.4);
        assert_eq!(end.edge, Edge::End);
    }

    #[test]
    fn test_exact_match_counts_in_both_directions() {
        let a = aligner();
        assert_eq!(a.nearest_word_start(10.4, Direction::Before).unwrap().time, 10.4);
        assert_eq!(a.nearest_word_start(10.4, Direction::After).unwrap().time, 10.4);
    }

    #[test]
    fn test_outside_window_fails() {
        let a = aligner();
        let err = a.nearest_word_start(20.0, Direction::After).unwrap_err();
        assert!(matches!(err, BoundaryError::NotFound { what: "start", .. }));
        assert!(a.nearest_word_end(5.0, Direction::Before).is_err());
        assert!(a.nearest_word_start_within(20.0, Direction::After, 30.0).is_ok());
    }

    #[test]
    fn test_boundary_picks_closest_edge() {
        let a = aligner();
        // end of "here" (10.7) beats its start (10.4)
        let b = a.nearest_word_boundary(10.72, Direction::Before).unwrap();
        assert_eq!(b.time, 10.7);
        assert_eq!(b.edge, Edge::End);
    }

    #[test]
    fn test_empty_transcript() {
        let a = WordAligner::new(&Transcript::new(vec![]).unwrap(), AlignerConfig::default());
        assert_eq!(
            a.nearest_word_start(1.0, Direction::Before),
            Err(BoundaryError::EmptyTranscript)
        );
    }
}
