//! Video inputs and the collaborators that supply their transcript and audio.
//!
//! Transcription and audio extraction happen upstream. By default each video
//! `talk.mp4` is accompanied by sidecars in the same directory:
//! - `talk.words.json`: `[{"text", "start", "end", "confidence"}]`
//! - `talk.wav`: the extracted soundtrack (a `.wav` input is its own audio)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mclip_media::{load_wav_mono, DecodedAudio};
use mclip_models::{SelectionResult, Transcript, Word};
use thiserror::Error;
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::RunReport;

/// File extensions picked up from the input directory.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "flv", "m4v", "wav"];

/// Suffix of the transcript sidecar.
pub const TRANSCRIPT_SUFFIX: &str = "words.json";

/// One video to analyse, identified by its file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoInput {
    pub id: String,
    pub path: PathBuf,
}

impl VideoInput {
    pub fn from_path(path: impl Into<PathBuf>) -> WorkerResult<Self> {
        let path = path.into();
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| WorkerError::input(format!("no usable file name in {}", path.display())))?
            .to_string();
        Ok(Self { id, path })
    }

    /// `<dir>/<id>.<suffix>` next to the video.
    pub fn sidecar(&self, suffix: &str) -> PathBuf {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        dir.join(format!("{}.{}", self.id, suffix))
    }

    pub fn is_wav(&self) -> bool {
        has_extension(&self.path, "wav")
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

/// Supported files in `dir`, sorted by path.
///
/// A `.wav` that shares its stem with a video is that video's audio
/// sidecar, not a separate input.
pub async fn discover_inputs(dir: &Path) -> WorkerResult<Vec<VideoInput>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut by_stem: BTreeMap<String, VideoInput> = BTreeMap::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() || !is_supported(&path) {
            continue;
        }
        let input = VideoInput::from_path(path)?;
        let replace = match by_stem.get(&input.id) {
            None => true,
            Some(existing) => match (existing.is_wav(), input.is_wav()) {
                (true, false) => true,
                (false, true) => false,
                _ => input.path < existing.path,
            },
        };
        if replace {
            by_stem.insert(input.id.clone(), input);
        }
    }

    let inputs: Vec<VideoInput> = by_stem.into_values().collect();
    debug!(dir = %dir.display(), inputs = inputs.len(), "Discovered inputs");
    Ok(inputs)
}

/// Opaque failure from the transcription collaborator.
#[derive(Debug, Error)]
#[error("Transcription failed: {0}")]
pub struct TranscriptionError(String);

impl TranscriptionError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Supplies the timed words for a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn transcript(&self, input: &VideoInput) -> Result<Transcript, TranscriptionError>;
}

/// Supplies decoded mono audio for a video.
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn audio(&self, input: &VideoInput) -> WorkerResult<DecodedAudio>;
}

/// Receives the final selection of each video.
#[async_trait]
pub trait ClipSink: Send + Sync {
    async fn deliver(&self, video_id: &str, selection: &SelectionResult, report: &RunReport) -> WorkerResult<()>;
}

/// Reads `<stem>.words.json` next to the video.
#[derive(Debug, Clone, Default)]
pub struct JsonTranscriptSource;

#[async_trait]
impl TranscriptSource for JsonTranscriptSource {
    async fn transcript(&self, input: &VideoInput) -> Result<Transcript, TranscriptionError> {
        let path = input.sidecar(TRANSCRIPT_SUFFIX);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| TranscriptionError::new(format!("{}: {e}", path.display())))?;
        let words: Vec<Word> = serde_json::from_slice(&bytes)
            .map_err(|e| TranscriptionError::new(format!("{}: {e}", path.display())))?;
        Transcript::new(words).map_err(|e| TranscriptionError::new(format!("{}: {e}", path.display())))
    }
}

/// Decodes the video's WAV sidecar, or the input itself when it is a WAV.
#[derive(Debug, Clone, Default)]
pub struct WavAudioSource;

#[async_trait]
impl AudioSource for WavAudioSource {
    async fn audio(&self, input: &VideoInput) -> WorkerResult<DecodedAudio> {
        let path = if input.is_wav() {
            input.path.clone()
        } else {
            input.sidecar("wav")
        };
        if !tokio::fs::try_exists(&path).await? {
            return Err(WorkerError::input(format!("audio not found: {}", path.display())));
        }
        let audio = tokio::task::spawn_blocking(move || load_wav_mono(&path)).await??;
        Ok(audio)
    }
}
