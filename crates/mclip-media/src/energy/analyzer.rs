//! Rolling-baseline spike detector.

use mclip_models::{AudioEnergyEnvelope, SignalHit, SignalKind};
use tracing::debug;

use super::config::EnergyConfig;
use crate::audio::validate_envelope;
use crate::error::AnalysisResult;

/// A run of consecutive hot samples.
#[derive(Debug, Clone, Copy)]
struct HotRun {
    start: f64,
    end: f64,
    peak: f64,
}

/// Detects energy spikes in an [`AudioEnergyEnvelope`].
#[derive(Debug, Clone, Default)]
pub struct EnergyAnalyzer {
    config: EnergyConfig,
}

impl EnergyAnalyzer {
    pub fn new(config: EnergyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnergyConfig {
        &self.config
    }

    /// Return one `energy` hit per spike, ordered by start.
    ///
    /// Fails if the envelope is empty or its timestamps do not strictly
    /// increase.
    pub fn detect_spikes(&self, envelope: &AudioEnergyEnvelope) -> AnalysisResult<Vec<SignalHit>> {
        validate_envelope(envelope)?;

        let samples = envelope.samples();
        let half = envelope.window_secs() / 2.0;
        let amplitudes: Vec<f64> = samples.iter().map(|s| s.amplitude()).collect();
        let baseline = centred_moving_average(
            &amplitudes,
            window_len(self.config.baseline_window_secs, envelope.window_secs()),
        );
        let global_peak = amplitudes.iter().copied().fold(0.0, f64::max);
        let min_amplitude = 10f64.powf(self.config.min_level_db / 20.0);

        let mut runs: Vec<HotRun> = Vec::new();
        let mut current: Option<HotRun> = None;

        for (i, sample) in samples.iter().enumerate() {
            let amp = amplitudes[i];
            let hot = amp > baseline[i] * self.config.spike_sensitivity && amp > min_amplitude;

            if !hot {
                runs.extend(current.take());
                continue;
            }
            match current.as_mut() {
                Some(run) => {
                    run.end = sample.timestamp + half;
                    run.peak = run.peak.max(amp);
                }
                None => {
                    current = Some(HotRun {
                        start: (sample.timestamp - half).max(0.0),
                        end: sample.timestamp + half,
                        peak: amp,
                    });
                }
            }
        }
        runs.extend(current);

        let coalesced = coalesce(runs, self.config.coalesce_gap_secs);
        let hits: Vec<SignalHit> = coalesced
            .into_iter()
            .filter(|run| run.end - run.start >= self.config.min_spike_secs)
            .map(|run| {
                let score = if global_peak > 0.0 { run.peak / global_peak } else { 0.0 };
                SignalHit::new(SignalKind::Energy, run.start, run.end, score)
            })
            .collect();

        debug!(
            samples = samples.len(),
            spikes = hits.len(),
            sensitivity = self.config.spike_sensitivity,
            "Energy spike detection complete"
        );

        Ok(hits)
    }
}

fn window_len(window_secs: f64, sample_secs: f64) -> usize {
    ((window_secs / sample_secs).round() as usize).max(1)
}

/// Centred moving average using prefix sums; edges use the partial window.
fn centred_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let mut prefix = Vec::with_capacity(values.len() + 1);
    prefix.push(0.0);
    for v in values {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + v);
    }

    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}

fn coalesce(runs: Vec<HotRun>, max_gap: f64) -> Vec<HotRun> {
    let mut merged: Vec<HotRun> = Vec::with_capacity(runs.len());
    for run in runs {
        match merged.last_mut() {
            Some(prev) if run.start - prev.end <= max_gap => {
                prev.end = prev.end.max(run.end);
                prev.peak = prev.peak.max(run.peak);
            }
            _ => merged.push(run),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use mclip_models::EnergySample;

    /// 10 Hz envelope at `base_db`, with louder sections at `loud_db`.
    fn envelope(duration: f64, base_db: f64, loud: &[(f64, f64)], loud_db: f64) -> AudioEnergyEnvelope {
        let n = (duration * 10.0).round() as usize;
        let samples = (0..n)
            .map(|i| {
                let ts = (i as f64 + 0.5) * 0.1;
                let level = if loud.iter().any(|(s, e)| ts > *s && ts < *e) {
                    loud_db
                } else {
                    base_db
                };
                EnergySample::new(ts, level)
            })
            .collect();
        AudioEnergyEnvelope::new(0.1, samples)
    }

    #[test]
    fn test_single_spike_detected() {
        let env = envelope(300.0, -30.0, &[(120.0, 126.0)], -10.0);
        let hits = EnergyAnalyzer::default().detect_spikes(&env).unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, SignalKind::Energy);
        assert!((hits[0].start - 120.0).abs() < 1e-6);
        assert!((hits[0].end - 126.0).abs() < 1e-6);
        assert!((hits[0].raw_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_close_spikes_coalesce() {
        let env = envelope(300.0, -30.0, &[(100.0, 102.0), (102.5, 104.0)], -10.0);
        let hits = EnergyAnalyzer::default().detect_spikes(&env).unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].end - 104.0).abs() < 1e-6);
    }

    #[test]
    fn test_distant_spikes_stay_separate() {
        let env = envelope(300.0, -30.0, &[(100.0, 102.0), (110.0, 112.0)], -10.0);
        let hits = EnergyAnalyzer::default().detect_spikes(&env).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].start < hits[1].start);
    }

    #[test]
    fn test_flat_envelope_has_no_spikes() {
        let env = envelope(120.0, -20.0, &[], -20.0);
        let hits = EnergyAnalyzer::default().detect_spikes(&env).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_quiet_spike_below_floor_ignored() {
        let env = envelope(300.0, -80.0, &[(50.0, 55.0)], -60.0);
        let hits = EnergyAnalyzer::default().detect_spikes(&env).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_lower_level_floor_admits_quiet_spike() {
        let env = envelope(300.0, -80.0, &[(50.0, 55.0)], -60.0);
        let analyzer = EnergyAnalyzer::new(EnergyConfig::default().with_min_level_db(-70.0));
        let hits = analyzer.detect_spikes(&env).unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].start - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_envelope_fails() {
        let env = AudioEnergyEnvelope::new(0.1, vec![]);
        assert!(matches!(
            EnergyAnalyzer::default().detect_spikes(&env),
            Err(AnalysisError::EmptyEnvelope)
        ));
    }

    #[test]
    fn test_non_increasing_timestamps_fail() {
        let env = AudioEnergyEnvelope::new(
            0.1,
            vec![
                EnergySample::new(0.05, -20.0),
                EnergySample::new(0.15, -20.0),
                EnergySample::new(0.10, -20.0),
            ],
        );
        assert!(matches!(
            EnergyAnalyzer::default().detect_spikes(&env),
            Err(AnalysisError::NonIncreasingTimestamps { index: 2 })
        ));
    }
}
