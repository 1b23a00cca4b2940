//! Shared data models for the MomentClip engine.
//!
//! This crate provides Serde-serializable types for:
//! - Transcripts (words and derived segments)
//! - Audio energy envelopes and silence intervals
//! - Signal hits and the weighting policy applied to them
//! - Candidate, scored and selected moments
//! - The exchanged moment record format

pub mod envelope;
pub mod error;
pub mod moment;
pub mod policy;
pub mod record;
pub mod signal;
pub mod silence;
pub mod timestamp;
pub mod transcript;

// Re-export common types
pub use envelope::{AudioEnergyEnvelope, EnergySample};
pub use error::{ModelError, ModelResult};
pub use moment::{
    CandidateMoment, DropReason, DroppedCandidate, Edge, FilterNote, ScoreSource, ScoredMoment,
    SelectionResult, SelectionShortfall,
};
pub use policy::{CategoryWeights, SignalPolicy};
pub use record::MomentRecord;
pub use signal::{KeywordCategory, SignalHit, SignalKind};
pub use silence::{SilenceInterval, ThresholdRecommendation, ThresholdSilence};
pub use transcript::{Segment, Transcript, Word};
