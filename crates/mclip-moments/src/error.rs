//! Boundary lookup errors.

use thiserror::Error;

use crate::aligner::Direction;

pub type BoundaryResult<T> = Result<T, BoundaryError>;

/// No word boundary near a timestamp.
///
/// Recovered by the filter, which drops only the offending candidate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoundaryError {
    #[error("No word {what} within {window:.2}s {direction} {timestamp:.3}s")]
    NotFound {
        what: &'static str,
        timestamp: f64,
        direction: Direction,
        window: f64,
    },

    #[error("Transcript has no words")]
    EmptyTranscript,
}

impl BoundaryError {
    pub fn not_found(what: &'static str, timestamp: f64, direction: Direction, window: f64) -> Self {
        Self::NotFound {
            what,
            timestamp,
            direction,
            window,
        }
    }
}
