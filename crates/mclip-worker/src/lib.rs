//! Moment extraction worker.
//!
//! This crate provides:
//! - The per-video pipeline from audio and transcript to selected moments
//! - Batch runs with bounded concurrency
//! - Folder watch mode with size-stability checks and retries
//! - JSON output of the selected moments and a run report

pub mod batch;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod watcher;

pub use batch::{run_batch, BatchFailure, BatchSummary};
pub use config::{policy_from_env, PipelineConfig, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use input::{
    discover_inputs, AudioSource, ClipSink, JsonTranscriptSource, TranscriptSource, TranscriptionError, VideoInput,
    WavAudioSource,
};
pub use logging::RunLogger;
pub use pipeline::{Pipeline, RunReport};
pub use report::JsonReportSink;
pub use watcher::{FileStatus, FolderWatcher, PollSummary};
