//! Multi-threshold silence detection.
//!
//! Each threshold is scanned independently with a small state machine:
//!
//! ```text
//!              level_db < threshold
//!     ┌──────────┐ ─────────────────► ┌───────────┐
//!     │ InSound  │                    │ InSilence │
//!     └──────────┘ ◄───────────────── └───────────┘
//!              level_db >= threshold
//!              (emit run if it lasted >= min_silence)
//! ```
//!
//! [`recommend_threshold`] then picks the threshold whose silence ratio is
//! closest to a target.

mod config;
mod detector;
mod recommend;

pub use config::SilenceConfig;
pub use detector::{silence_hits, speech_regions, SilenceDetector, SpeechRegion};
pub use recommend::recommend_threshold;
