//! Worker and pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use mclip_ai::ProviderConfig;
use mclip_media::{EnergyConfig, SilenceConfig};
use mclip_models::{SignalKind, SignalPolicy};
use mclip_moments::{AlignerConfig, ExtractorConfig, FilterConfig, ScorerConfig, SelectorConfig};

use crate::error::{WorkerError, WorkerResult};

/// Stage configuration for one video run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub energy: EnergyConfig,
    pub silence: SilenceConfig,
    pub aligner: AlignerConfig,
    pub extractor: ExtractorConfig,
    pub filter: FilterConfig,
    pub scorer: ScorerConfig,
    pub selector: SelectorConfig,
    pub policy: SignalPolicy,
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self {
            energy: EnergyConfig::from_env(),
            silence: SilenceConfig::from_env(),
            aligner: AlignerConfig::from_env(),
            extractor: ExtractorConfig::from_env(),
            filter: FilterConfig::from_env(),
            scorer: ScorerConfig::from_env(),
            selector: SelectorConfig::from_env(),
            policy: policy_from_env(),
        }
    }

    /// Set the clip length bounds on every stage that checks them.
    pub fn with_lengths(mut self, min_length: f64, max_length: f64) -> Self {
        self.extractor = self.extractor.with_lengths(min_length, max_length);
        self.filter = self.filter.with_lengths(min_length, max_length);
        self.selector = self.selector.with_lengths(min_length, max_length);
        self
    }

    pub fn with_target_count(mut self, target_count: usize) -> Self {
        self.selector = self.selector.with_target_count(target_count);
        self
    }

    pub fn with_scorer(mut self, scorer: ScorerConfig) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_policy(mut self, policy: SignalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn validate(&self) -> WorkerResult<()> {
        let lengths = [
            ("extractor", self.extractor.min_length, self.extractor.max_length),
            ("filter", self.filter.min_length, self.filter.max_length),
            ("selector", self.selector.min_length, self.selector.max_length),
        ];
        for (stage, min, max) in lengths {
            if !(min > 0.0 && min <= max) {
                return Err(WorkerError::config(format!(
                    "{stage}: invalid clip lengths min={min} max={max}"
                )));
            }
        }
        if self.silence.thresholds_db.is_empty() {
            return Err(WorkerError::config("no silence thresholds configured"));
        }
        if self.scorer.batch_size == 0 {
            return Err(WorkerError::config("scoring batch size must be positive"));
        }
        Ok(())
    }
}

/// Kind weights from `MCLIP_WEIGHT_<KIND>`, e.g. `MCLIP_WEIGHT_ENERGY=0.4`.
pub fn policy_from_env() -> SignalPolicy {
    SignalKind::ALL.iter().fold(SignalPolicy::default(), |policy, kind| {
        let var = format!("MCLIP_WEIGHT_{}", kind.as_str().to_ascii_uppercase());
        match std::env::var(&var).ok().and_then(|s| s.parse::<f64>().ok()) {
            Some(weight) => policy.with_kind_weight(*kind, weight),
            None => policy,
        }
    })
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory scanned for videos
    pub input_dir: PathBuf,
    /// Directory receiving `<stem>.moments.json`
    pub output_dir: PathBuf,
    /// Videos analysed in parallel
    pub max_concurrent_videos: usize,
    /// Keep polling `input_dir` instead of a single batch
    pub watch: bool,
    pub watch_interval: Duration,
    /// Attempts per file before it is marked failed
    pub watch_max_attempts: u32,
    pub provider: ProviderConfig,
    pub pipeline: PipelineConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./input"),
            output_dir: PathBuf::from("./output"),
            max_concurrent_videos: 2,
            watch: false,
            watch_interval: Duration::from_secs(5),
            watch_max_attempts: 3,
            provider: ProviderConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            input_dir: std::env::var("MCLIP_INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./input")),
            output_dir: std::env::var("MCLIP_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./output")),
            max_concurrent_videos: std::env::var("MCLIP_MAX_CONCURRENT_VIDEOS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            watch: std::env::var("MCLIP_WATCH")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            watch_interval: Duration::from_secs(
                std::env::var("MCLIP_WATCH_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            watch_max_attempts: std::env::var("MCLIP_WATCH_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            provider: ProviderConfig::from_env(),
            pipeline: PipelineConfig::from_env(),
        }
    }

    pub fn with_dirs(mut self, input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        self.input_dir = input_dir.into();
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_max_concurrent_videos(mut self, n: usize) -> Self {
        self.max_concurrent_videos = n;
        self
    }

    pub fn with_watch(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.watch = true;
        self.watch_interval = interval;
        self.watch_max_attempts = max_attempts;
        self
    }

    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.max_concurrent_videos == 0 {
            return Err(WorkerError::config("max_concurrent_videos must be positive"));
        }
        if self.watch && self.watch_max_attempts == 0 {
            return Err(WorkerError::config("watch_max_attempts must be positive"));
        }
        self.pipeline.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = WorkerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.selector.target_count, 8);
        assert_eq!(config.pipeline.filter.max_length, 60.0);
    }

    #[test]
    fn test_with_lengths_applies_to_every_stage() {
        let pipeline = PipelineConfig::default().with_lengths(10.0, 30.0);
        assert_eq!(pipeline.extractor.max_length, 30.0);
        assert_eq!(pipeline.filter.min_length, 10.0);
        assert_eq!(pipeline.selector.max_length, 30.0);
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn test_inverted_lengths_rejected() {
        let pipeline = PipelineConfig::default().with_lengths(40.0, 20.0);
        assert!(matches!(pipeline.validate(), Err(WorkerError::Config(_))));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = WorkerConfig::default().with_max_concurrent_videos(0);
        assert!(config.validate().is_err());
    }
}
