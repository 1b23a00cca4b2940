//! Worker error types.

use mclip_media::AnalysisError;
use mclip_models::ModelError;
use thiserror::Error;

use crate::input::TranscriptionError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Aborts the current video only; a batch moves on to the next one.
    pub fn is_fatal_for_video(&self) -> bool {
        !matches!(self, WorkerError::Config(_))
    }

    /// Worth another attempt in watch mode (sidecars may still be arriving).
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Input(_) | WorkerError::Io(_) | WorkerError::Delivery(_) | WorkerError::Task(_) => true,
            WorkerError::Analysis(e) => e.is_input_error(),
            WorkerError::Model(_) | WorkerError::Config(_) | WorkerError::Json(_) => false,
        }
    }
}

impl From<TranscriptionError> for WorkerError {
    fn from(e: TranscriptionError) -> Self {
        Self::Input(e.to_string())
    }
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_abort_the_run() {
        assert!(!WorkerError::config("min_length > max_length").is_fatal_for_video());
        assert!(WorkerError::input("missing transcript").is_fatal_for_video());
    }

    #[test]
    fn test_transcription_error_is_input_error() {
        let err: WorkerError = TranscriptionError::new("speech model crashed").into();
        assert!(matches!(err, WorkerError::Input(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_envelope_errors_not_retried() {
        let err: WorkerError = AnalysisError::EmptyEnvelope.into();
        assert!(!err.is_retryable());
    }
}
