//! Error types for audio analysis.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors from decoding audio or analysing an envelope.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Energy envelope is empty")]
    EmptyEnvelope,

    #[error("Envelope timestamps must increase (sample {index})")]
    NonIncreasingTimestamps { index: usize },

    #[error("Invalid analysis window: {0}s")]
    InvalidWindow(f64),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("No audio data found in {0}")]
    NoAudioData(PathBuf),

    #[error("Failed to decode audio: {0}")]
    Decode(#[from] hound::Error),
}

impl AnalysisError {
    /// True for failures caused by the input file rather than the envelope.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::NoAudioData(_) | Self::Decode(_) | Self::InvalidSampleRate(_))
    }
}
