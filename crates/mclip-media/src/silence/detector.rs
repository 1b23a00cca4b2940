//! Silence interval detection over an energy envelope.

use mclip_models::{
    AudioEnergyEnvelope, SignalHit, SignalKind, SilenceInterval, ThresholdSilence,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::SilenceConfig;
use crate::audio::validate_envelope;
use crate::error::AnalysisResult;

/// A span between silences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechRegion {
    pub start: f64,
    pub end: f64,
}

impl SpeechRegion {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

enum State {
    InSound,
    InSilence { start: f64 },
}

/// Tracks silent runs for one threshold.
struct SilenceTracker {
    threshold_db: f64,
    min_silence_secs: f64,
    state: State,
    intervals: Vec<SilenceInterval>,
}

impl SilenceTracker {
    fn new(threshold_db: f64, min_silence_secs: f64) -> Self {
        Self {
            threshold_db,
            min_silence_secs,
            state: State::InSound,
            intervals: Vec::new(),
        }
    }

    /// Feed one envelope window starting at `window_start`.
    fn ingest(&mut self, level_db: f64, window_start: f64) {
        let silent = level_db < self.threshold_db;
        match (&self.state, silent) {
            (State::InSound, true) => {
                self.state = State::InSilence { start: window_start };
            }
            (State::InSilence { start }, false) => {
                let start = *start;
                self.close(start, window_start);
                self.state = State::InSound;
            }
            _ => {}
        }
    }

    fn close(&mut self, start: f64, end: f64) {
        if end - start >= self.min_silence_secs {
            self.intervals.push(SilenceInterval {
                start,
                end,
                threshold_db: self.threshold_db,
            });
        }
    }

    fn finalize(mut self, total_duration: f64) -> ThresholdSilence {
        if let State::InSilence { start } = self.state {
            self.close(start, total_duration);
        }
        ThresholdSilence {
            threshold_db: self.threshold_db,
            intervals: self.intervals,
        }
    }
}

/// Finds silence intervals at several dB thresholds.
#[derive(Debug, Clone, Default)]
pub struct SilenceDetector {
    config: SilenceConfig,
}

impl SilenceDetector {
    pub fn new(config: SilenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SilenceConfig {
        &self.config
    }

    /// Scan the envelope once per threshold; results keep input order.
    pub fn detect(
        &self,
        envelope: &AudioEnergyEnvelope,
        thresholds_db: &[f64],
    ) -> AnalysisResult<Vec<ThresholdSilence>> {
        validate_envelope(envelope)?;

        let half = envelope.window_secs() / 2.0;
        let duration = envelope.duration();
        let mut trackers: Vec<SilenceTracker> = thresholds_db
            .iter()
            .map(|t| SilenceTracker::new(*t, self.config.min_silence_secs))
            .collect();

        for sample in envelope.samples() {
            let window_start = (sample.timestamp - half).max(0.0);
            for tracker in trackers.iter_mut() {
                tracker.ingest(sample.level_db, window_start);
            }
        }

        let results: Vec<ThresholdSilence> =
            trackers.into_iter().map(|t| t.finalize(duration)).collect();

        for result in &results {
            debug!(
                threshold_db = result.threshold_db,
                intervals = result.intervals.len(),
                silence_secs = format!("{:.1}", result.total_secs()),
                "Silence scan complete"
            );
        }

        Ok(results)
    }

    /// Scan at the configured thresholds.
    pub fn detect_configured(
        &self,
        envelope: &AudioEnergyEnvelope,
    ) -> AnalysisResult<Vec<ThresholdSilence>> {
        self.detect(envelope, &self.config.thresholds_db)
    }
}

/// Spans of `[0, duration]` not covered by any silence interval.
pub fn speech_regions(intervals: &[SilenceInterval], duration: f64) -> Vec<SpeechRegion> {
    let mut sorted: Vec<&SilenceInterval> = intervals.iter().collect();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut regions = Vec::new();
    let mut cursor = 0.0_f64;
    for silence in sorted {
        if silence.start > cursor {
            regions.push(SpeechRegion {
                start: cursor,
                end: silence.start.min(duration),
            });
        }
        cursor = cursor.max(silence.end);
    }
    if cursor < duration {
        regions.push(SpeechRegion {
            start: cursor,
            end: duration,
        });
    }
    regions.retain(|r| r.duration() > 0.0);
    regions
}

/// Express silence intervals as `silence` hits; one second or more scores 1.0.
pub fn silence_hits(intervals: &[SilenceInterval]) -> Vec<SignalHit> {
    intervals
        .iter()
        .map(|s| SignalHit::new(SignalKind::Silence, s.start, s.end, s.duration()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mclip_models::EnergySample;

    fn envelope(levels: &[(f64, f64, f64)], duration: f64) -> AudioEnergyEnvelope {
        let n = (duration * 10.0).round() as usize;
        let samples = (0..n)
            .map(|i| {
                let ts = (i as f64 + 0.5) * 0.1;
                let level = levels
                    .iter()
                    .find(|(s, e, _)| ts > *s && ts < *e)
                    .map(|(_, _, db)| *db)
                    .unwrap_or(-10.0);
                EnergySample::new(ts, level)
            })
            .collect();
        AudioEnergyEnvelope::new(0.1, samples)
    }

    #[test]
    fn test_detects_silence_per_threshold() {
        let env = envelope(&[(2.0, 4.0, -60.0), (6.0, 7.0, -35.0)], 10.0);
        let results = SilenceDetector::default()
            .detect(&env, &[-30.0, -50.0])
            .unwrap();

        assert_eq!(results[0].threshold_db, -30.0);
        assert_eq!(results[0].intervals.len(), 2);
        assert_eq!(results[1].intervals.len(), 1);
        assert!((results[1].intervals[0].start - 2.0).abs() < 1e-6);
        assert!((results[1].intervals[0].end - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_micro_silence_ignored() {
        let env = envelope(&[(2.0, 2.2, -60.0)], 5.0);
        let results = SilenceDetector::default().detect(&env, &[-40.0]).unwrap();
        assert!(results[0].intervals.is_empty());
    }

    #[test]
    fn test_trailing_silence_closed_at_duration() {
        let env = envelope(&[(8.0, 11.0, -60.0)], 10.0);
        let results = SilenceDetector::default().detect(&env, &[-40.0]).unwrap();
        let last = results[0].intervals.last().unwrap();
        assert!((last.end - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_speech_regions_invert_silence() {
        let silences = vec![
            SilenceInterval { start: 0.0, end: 1.0, threshold_db: -40.0 },
            SilenceInterval { start: 5.0, end: 6.0, threshold_db: -40.0 },
        ];
        let regions = speech_regions(&silences, 10.0);
        assert_eq!(regions, vec![
            SpeechRegion { start: 1.0, end: 5.0 },
            SpeechRegion { start: 6.0, end: 10.0 },
        ]);
    }

    #[test]
    fn test_silence_hits_scale_with_duration() {
        let silences = vec![
            SilenceInterval { start: 0.0, end: 0.5, threshold_db: -40.0 },
            SilenceInterval { start: 5.0, end: 7.0, threshold_db: -40.0 },
        ];
        let hits = silence_hits(&silences);
        assert_eq!(hits[0].raw_score, 0.5);
        assert_eq!(hits[1].raw_score, 1.0);
        assert!(hits.iter().all(|h| h.kind == SignalKind::Silence));
    }
}
