//! Per-video moment extraction.
//!
//! ```text
//!                 ┌─► energy spikes ──┐
//! audio ─► envelope                   │
//!                 └─► silence scan ───┼─► extract ─► filter ─► score ─► select ─► sink
//! transcript ───────► lexical cues ───┘
//! ```
//!
//! The three detectors share nothing but the immutable envelope and
//! transcript; everything after the join runs in order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use mclip_ai::ProviderSelection;
use mclip_media::{
    compute_envelope, recommend_threshold, silence_hits, speech_regions, EnergyAnalyzer, SilenceDetector, SpeechRegion,
    DEFAULT_ENVELOPE_WINDOW_SECS,
};
use mclip_models::{
    DroppedCandidate, MomentRecord, SelectionShortfall, SignalHit, ThresholdRecommendation, Transcript,
};
use mclip_moments::{
    CandidateExtractor, FilterContext, KeywordTaxonomy, LexicalDetector, MomentFilter, MomentScorer, MomentSelector,
    ScoringWarning, WordAligner,
};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::input::{AudioSource, ClipSink, JsonTranscriptSource, TranscriptSource, VideoInput, WavAudioSource};
use crate::logging::RunLogger;
use crate::metrics;

/// Diagnostics for one video run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub video_id: String,
    pub duration_secs: f64,
    pub provider: String,
    /// Threshold chosen for silence snapping
    pub silence_threshold: Option<ThresholdRecommendation>,
    pub speech_secs: f64,
    /// Hit count per signal kind
    pub hit_counts: BTreeMap<String, usize>,
    pub candidates: usize,
    pub dropped: Vec<DroppedCandidate>,
    pub scoring_warnings: Vec<ScoringWarning>,
    /// Selected moments, highest score first
    pub moments: Vec<MomentRecord>,
    pub shortfall: Option<SelectionShortfall>,
    pub stage_ms: BTreeMap<String, u64>,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl RunReport {
    pub(crate) fn for_video(video_id: &str, provider: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            video_id: video_id.to_string(),
            duration_secs: 0.0,
            provider: provider.to_string(),
            silence_threshold: None,
            speech_secs: 0.0,
            hit_counts: BTreeMap::new(),
            candidates: 0,
            dropped: Vec::new(),
            scoring_warnings: Vec::new(),
            moments: Vec::new(),
            shortfall: None,
            stage_ms: BTreeMap::new(),
            elapsed_ms: 0,
            completed_at: Utc::now(),
        }
    }
}

/// Runs the full analysis for one video at a time; share it behind an `Arc`.
pub struct Pipeline {
    config: PipelineConfig,
    scorer: MomentScorer,
    lexical: LexicalDetector,
    transcripts: Arc<dyn TranscriptSource>,
    audio: Arc<dyn AudioSource>,
    sink: Arc<dyn ClipSink>,
}

impl Pipeline {
    /// Pipeline reading JSON transcripts and WAV audio sidecars.
    pub fn new(config: PipelineConfig, provider: ProviderSelection, sink: Arc<dyn ClipSink>) -> Self {
        let scorer = MomentScorer::from_selection(provider, config.policy, config.scorer.clone());
        let lexical = LexicalDetector::new(KeywordTaxonomy::default(), config.policy, config.filter.hook_window_secs);
        Self {
            config,
            scorer,
            lexical,
            transcripts: Arc::new(JsonTranscriptSource),
            audio: Arc::new(WavAudioSource),
            sink,
        }
    }

    pub fn with_transcript_source(mut self, source: Arc<dyn TranscriptSource>) -> Self {
        self.transcripts = source;
        self
    }

    pub fn with_audio_source(mut self, source: Arc<dyn AudioSource>) -> Self {
        self.audio = source;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.scorer.provider_name()
    }

    pub async fn run_video(&self, input: &VideoInput) -> WorkerResult<RunReport> {
        let logger = RunLogger::new(&input.id);
        let result = self.run(input, &logger).instrument(logger.create_span()).await;

        metrics::record_video(result.is_ok());
        if let Err(e) = &result {
            logger.log_error(&e.to_string());
        }
        result
    }

    async fn run(&self, input: &VideoInput, logger: &RunLogger) -> WorkerResult<RunReport> {
        let started = Instant::now();
        let mut report = RunReport::for_video(&input.id, self.scorer.provider_name());
        logger.log_start(&input.path.display().to_string());

        // Load
        let stage = Instant::now();
        let (transcript, audio) = tokio::try_join!(
            async { self.transcripts.transcript(input).await.map_err(WorkerError::from) },
            self.audio.audio(input),
        )?;
        if transcript.is_empty() {
            return Err(WorkerError::input("transcript has no words"));
        }
        let duration = audio.duration_secs();
        if duration <= 0.0 {
            return Err(WorkerError::input("audio has no samples"));
        }
        report.duration_secs = duration;
        finish_stage(logger, &mut report, "load", stage, transcript.words().len());

        // Detect: energy and silence on blocking threads, lexical inline
        let stage = Instant::now();
        let envelope = tokio::task::spawn_blocking(move || {
            compute_envelope(&audio.samples, audio.sample_rate, DEFAULT_ENVELOPE_WINDOW_SECS)
        })
        .await??;
        let envelope = Arc::new(envelope);

        let energy_task = {
            let envelope = Arc::clone(&envelope);
            let analyzer = EnergyAnalyzer::new(self.config.energy.clone());
            tokio::task::spawn_blocking(move || analyzer.detect_spikes(&envelope))
        };
        let silence_task = {
            let envelope = Arc::clone(&envelope);
            let detector = SilenceDetector::new(self.config.silence.clone());
            tokio::task::spawn_blocking(move || detector.detect_configured(&envelope))
        };
        let lexical_task = async { self.lexical.detect(&transcript) };

        let (energy, silence, lexical) = tokio::join!(energy_task, silence_task, lexical_task);
        let energy = energy??;
        let silence = silence??;

        let recommendation = recommend_threshold(&silence, duration, self.config.silence.target_ratio);
        let chosen = recommendation
            .as_ref()
            .and_then(|r| silence.iter().find(|s| s.threshold_db == r.threshold_db));
        let silence = chosen.map(|s| silence_hits(&s.intervals)).unwrap_or_default();
        report.speech_secs = chosen
            .map(|s| speech_regions(&s.intervals, duration).iter().map(SpeechRegion::duration).sum())
            .unwrap_or(duration);
        report.silence_threshold = recommendation;

        let hits: Vec<SignalHit> = energy.into_iter().chain(silence).chain(lexical).collect();
        for hit in &hits {
            *report.hit_counts.entry(hit.kind.as_str().to_string()).or_default() += 1;
        }
        finish_stage(logger, &mut report, "detect", stage, hits.len());

        // Extract
        let stage = Instant::now();
        let candidates = CandidateExtractor::new(self.config.extractor, self.config.policy).extract(&hits, duration);
        report.candidates = candidates.len();
        finish_stage(logger, &mut report, "extract", stage, candidates.len());

        // Filter
        let stage = Instant::now();
        let filtered = self.filter(candidates, &transcript, duration);
        for dropped in &filtered.dropped {
            logger.log_drop(dropped);
            metrics::record_drop(dropped.reason.as_str());
        }
        report.dropped = filtered.dropped;
        finish_stage(logger, &mut report, "filter", stage, filtered.survivors.len());

        // Score
        let stage = Instant::now();
        let scoring = self.scorer.score(filtered.survivors, &transcript).await;
        for warning in &scoring.warnings {
            logger.log_fallback(self.scorer.provider_name(), warning);
            metrics::record_fallback(warning.kind.as_str());
        }
        report.scoring_warnings = scoring.warnings;
        finish_stage(logger, &mut report, "score", stage, scoring.moments.len());

        // Select
        let stage = Instant::now();
        let selection = MomentSelector::new(self.config.selector).select(scoring.moments);
        report.moments = selection.moments.iter().map(MomentRecord::from).collect();
        report.shortfall = selection.shortfall;
        metrics::record_selected(selection.moments.len());
        finish_stage(logger, &mut report, "select", stage, selection.moments.len());

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        report.completed_at = Utc::now();

        // Deliver
        let stage = Instant::now();
        self.sink.deliver(&input.id, &selection, &report).await?;
        finish_stage(logger, &mut report, "deliver", stage, selection.moments.len());

        logger.log_complete(selection.moments.len(), started.elapsed());
        Ok(report)
    }

    fn filter(
        &self,
        candidates: Vec<mclip_models::CandidateMoment>,
        transcript: &Transcript,
        duration: f64,
    ) -> mclip_moments::FilterOutcome {
        let aligner = WordAligner::new(transcript, self.config.aligner);
        let ctx = FilterContext {
            transcript,
            aligner: &aligner,
            hooks: self.lexical.hook(),
            duration,
        };
        MomentFilter::new(self.config.filter, self.config.policy).apply(candidates, &ctx)
    }
}

fn finish_stage(logger: &RunLogger, report: &mut RunReport, stage: &'static str, since: Instant, items: usize) {
    let elapsed = since.elapsed();
    logger.log_stage(stage, elapsed, items);
    metrics::record_stage(stage, elapsed);
    report.stage_ms.insert(stage.to_string(), elapsed.as_millis() as u64);
}
