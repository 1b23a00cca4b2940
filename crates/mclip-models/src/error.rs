//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid word at index {index}: {reason}")]
    InvalidWord { index: usize, reason: String },

    #[error("Words out of order at index {index}: start {start:.3}s precedes previous start {previous:.3}s")]
    UnorderedWords {
        index: usize,
        start: f64,
        previous: f64,
    },

    #[error("Invalid interval [{start:.3}s, {end:.3}s]")]
    InvalidInterval { start: f64, end: f64 },

    #[error("Score {0} outside [0, 10]")]
    ScoreOutOfRange(f64),
}

impl ModelError {
    pub fn invalid_word(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidWord {
            index,
            reason: reason.into(),
        }
    }
}
