//! Audio-side analysis for moment extraction.
//!
//! This crate provides:
//! - WAV decoding to mono PCM
//! - Loudness envelope computation
//! - Energy spike detection against a rolling baseline
//! - Multi-threshold silence detection and threshold recommendation

pub mod audio;
pub mod energy;
pub mod error;
pub mod silence;

pub use audio::{
    compute_envelope, load_wav_mono, validate_envelope, DecodedAudio, DEFAULT_ENVELOPE_WINDOW_SECS,
};
pub use energy::{EnergyAnalyzer, EnergyConfig};
pub use error::{AnalysisError, AnalysisResult};
pub use silence::{
    recommend_threshold, silence_hits, speech_regions, SilenceConfig, SilenceDetector,
    SpeechRegion,
};

/// Parse an `f64` environment variable, keeping `default` when unset or invalid.
pub(crate) fn env_f64(var: &str, default: f64) -> f64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
