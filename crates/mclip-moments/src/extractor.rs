//! Candidate extraction: fuses energy, silence and lexical hits into
//! non-overlapping candidate windows.
//!
//! ```text
//! energy seeds ──► absorb nearby keyword/hook hits ──┐
//!                                                    ├─► pad to min length ─► snap to silence ─► merge overlaps
//! leftover keyword/hook hits ──► gap clusters ───────┘
//! ```

use mclip_models::timestamp::{intervals_overlap, TIME_EPSILON};
use mclip_models::{CandidateMoment, SignalHit, SignalKind, SignalPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Extractor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Lexical hits this close to a window join it
    pub gap_tolerance_secs: f64,
    /// Windows are padded up to this length
    pub min_length: f64,
    /// Absorption never grows a window past this length
    pub max_length: f64,
    /// Edges move outward to a silence edge this close
    pub silence_snap_secs: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            gap_tolerance_secs: 3.0,
            min_length: 15.0,
            max_length: 60.0,
            silence_snap_secs: 1.5,
        }
    }
}

impl ExtractorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gap_tolerance_secs: env_f64("MCLIP_GAP_TOLERANCE_SECS", defaults.gap_tolerance_secs),
            min_length: env_f64("MCLIP_MIN_LENGTH_SECS", defaults.min_length),
            max_length: env_f64("MCLIP_MAX_LENGTH_SECS", defaults.max_length),
            silence_snap_secs: env_f64("MCLIP_SILENCE_SNAP_SECS", defaults.silence_snap_secs),
        }
    }

    pub fn with_gap_tolerance(mut self, secs: f64) -> Self {
        self.gap_tolerance_secs = secs;
        self
    }

    pub fn with_lengths(mut self, min_length: f64, max_length: f64) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    pub fn with_silence_snap(mut self, secs: f64) -> Self {
        self.silence_snap_secs = secs;
        self
    }
}

pub(crate) fn env_f64(var: &str, default: f64) -> f64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// A window under construction.
#[derive(Debug, Clone)]
struct Window {
    start: f64,
    end: f64,
    hits: Vec<SignalHit>,
}

impl Window {
    fn from_hit(hit: &SignalHit) -> Self {
        Self {
            start: hit.start,
            end: hit.end,
            hits: vec![hit.clone()],
        }
    }

    fn add(&mut self, hit: &SignalHit) {
        if !self.hits.contains(hit) {
            self.hits.push(hit.clone());
        }
    }
}

/// Fuses signal hits into candidate moments.
#[derive(Debug, Clone, Default)]
pub struct CandidateExtractor {
    config: ExtractorConfig,
    policy: SignalPolicy,
}

impl CandidateExtractor {
    pub fn new(config: ExtractorConfig, policy: SignalPolicy) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Build non-overlapping candidates, ordered by start.
    ///
    /// `hits` may contain every kind; `duration` bounds all windows.
    pub fn extract(&self, hits: &[SignalHit], duration: f64) -> Vec<CandidateMoment> {
        if duration <= 0.0 {
            return Vec::new();
        }

        let mut sorted: Vec<&SignalHit> = hits.iter().collect();
        sorted.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));

        let seeds: Vec<&SignalHit> = sorted.iter().copied().filter(|h| h.kind == SignalKind::Energy).collect();
        let lexical: Vec<&SignalHit> = sorted
            .iter()
            .copied()
            .filter(|h| h.kind.is_lexical() && h.kind.seeds_candidates())
            .collect();
        let silences: Vec<&SignalHit> = sorted.iter().copied().filter(|h| h.kind == SignalKind::Silence).collect();

        let mut absorbed = vec![false; lexical.len()];
        let mut windows: Vec<Window> = seeds
            .iter()
            .map(|seed| self.grow_seed(seed, &lexical, &mut absorbed))
            .collect();
        let energy_windows = windows.len();

        let leftovers: Vec<&SignalHit> = lexical
            .iter()
            .zip(&absorbed)
            .filter(|(_, taken)| !**taken)
            .map(|(hit, _)| *hit)
            .collect();
        windows.extend(self.cluster(&leftovers));
        let lexical_windows = windows.len() - energy_windows;

        for window in &mut windows {
            self.pad(window, duration);
            self.snap_to_silence(window, &silences, duration);
        }

        let merged = merge(windows);
        let candidates: Vec<CandidateMoment> = merged
            .into_iter()
            .filter_map(|mut window| {
                for hit in &sorted {
                    if hit.overlaps(window.start, window.end) {
                        window.add(hit);
                    }
                }
                window.hits.sort_by(|a, b| {
                    self.policy
                        .hit_strength(b)
                        .total_cmp(&self.policy.hit_strength(a))
                        .then(a.start.total_cmp(&b.start))
                });
                match CandidateMoment::new(window.start, window.end, window.hits) {
                    Ok(candidate) => Some(candidate),
                    Err(e) => {
                        debug!(error = %e, "Discarding degenerate window");
                        None
                    }
                }
            })
            .collect();

        info!(
            hits = hits.len(),
            energy_seeds = energy_windows,
            lexical_seeds = lexical_windows,
            candidates = candidates.len(),
            "Candidate extraction complete"
        );

        candidates
    }

    /// Grow an energy seed over nearby keyword and hook hits until stable.
    fn grow_seed(&self, seed: &SignalHit, lexical: &[&SignalHit], absorbed: &mut [bool]) -> Window {
        let mut window = Window::from_hit(seed);
        let mut taken = vec![false; lexical.len()];

        loop {
            let mut changed = false;
            for (i, hit) in lexical.iter().enumerate() {
                if taken[i] || hit.gap_to(window.start, window.end) > self.config.gap_tolerance_secs {
                    continue;
                }
                let extension = (window.start - hit.start).max(hit.end - window.end).max(0.0);
                let grown = window.end - window.start + 2.0 * extension;
                if grown > self.config.max_length + TIME_EPSILON {
                    continue;
                }
                window.start -= extension;
                window.end += extension;
                window.add(hit);
                taken[i] = true;
                absorbed[i] = true;
                changed = true;
            }
            if !changed {
                break;
            }
        }

        window
    }

    /// Group consecutive hits whose gaps stay within tolerance.
    fn cluster(&self, hits: &[&SignalHit]) -> Vec<Window> {
        let mut clusters: Vec<Window> = Vec::new();
        for hit in hits {
            match clusters.last_mut() {
                Some(current) if hit.start - current.end <= self.config.gap_tolerance_secs => {
                    current.end = current.end.max(hit.end);
                    current.add(hit);
                }
                _ => clusters.push(Window::from_hit(hit)),
            }
        }
        clusters
    }

    /// Expand symmetrically to `min_length`, keeping the window inside `[0, duration]`.
    fn pad(&self, window: &mut Window, duration: f64) {
        let length = window.end - window.start;
        if length < self.config.min_length {
            let deficit = (self.config.min_length - length) / 2.0;
            window.start -= deficit;
            window.end += deficit;
        }

        if window.start < 0.0 {
            window.end -= window.start;
            window.start = 0.0;
        }
        if window.end > duration {
            window.start -= window.end - duration;
            window.end = duration;
        }
        window.start = window.start.max(0.0);
    }

    /// Move each edge outward onto the nearest adjacent silence edge.
    fn snap_to_silence(&self, window: &mut Window, silences: &[&SignalHit], duration: f64) {
        let snap = self.config.silence_snap_secs;
        let room = self.config.max_length - (window.end - window.start);
        if room <= 0.0 {
            return;
        }

        let before = silences
            .iter()
            .filter(|s| s.end <= window.start + TIME_EPSILON && window.start - s.end <= snap)
            .max_by(|a, b| a.end.total_cmp(&b.end));
        let mut used = 0.0;
        if let Some(silence) = before {
            let shift = window.start - silence.end;
            if shift <= room {
                window.start = silence.end;
                window.add(silence);
                used = shift;
            }
        }

        let after = silences
            .iter()
            .filter(|s| s.start >= window.end - TIME_EPSILON && s.start - window.end <= snap && s.start <= duration)
            .min_by(|a, b| a.start.total_cmp(&b.start));
        if let Some(silence) = after {
            if silence.start - window.end <= room - used {
                window.end = silence.start;
                window.add(silence);
            }
        }
    }
}

/// Merge overlapping windows (union interval, union hits); input order is irrelevant.
fn merge(mut windows: Vec<Window>) -> Vec<Window> {
    windows.sort_by(|a, b| a.start.total_cmp(&b.start));
    let mut merged: Vec<Window> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(prev) if intervals_overlap(prev.start, prev.end, window.start, window.end) => {
                prev.end = prev.end.max(window.end);
                for hit in &window.hits {
                    prev.add(hit);
                }
            }
            _ => merged.push(window),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use mclip_models::KeywordCategory;

    fn extractor() -> CandidateExtractor {
        CandidateExtractor::default()
    }

    fn energy(start: f64, end: f64) -> SignalHit {
        SignalHit::new(SignalKind::Energy, start, end, 0.9)
    }

    fn keyword(start: f64, end: f64) -> SignalHit {
        SignalHit::keyword(KeywordCategory::Emotional, start, end, 0.65)
    }

    #[test]
    fn test_seed_absorbs_nearby_keyword() {
        let hits = vec![energy(120.0, 126.0), keyword(127.5, 128.0)];
        let candidates = extractor().extract(&hits, 300.0);

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert!(c.has_kind(SignalKind::Energy));
        assert!(c.has_kind(SignalKind::Keyword));
        assert!(c.start <= 120.0 && c.end >= 128.0);
        assert!((c.duration() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_lexical_only_cluster_seeds_candidate() {
        let hits = vec![
            keyword(50.0, 50.5),
            SignalHit::new(SignalKind::Hook, 52.0, 55.0, 0.67),
            SignalHit::new(SignalKind::Statement, 200.0, 210.0, 0.8),
        ];
        let candidates = extractor().extract(&hits, 300.0);

        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].has_kind(SignalKind::Hook));
        assert!(!candidates[0].has_kind(SignalKind::Energy));
    }

    #[test]
    fn test_overlapping_windows_merge() {
        let hits = vec![energy(100.0, 104.0), energy(108.0, 112.0)];
        let candidates = extractor().extract(&hits, 300.0);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].hits_of(SignalKind::Energy).count(), 2);
    }

    #[test]
    fn test_output_is_sorted_and_disjoint() {
        let hits = vec![
            energy(200.0, 203.0),
            energy(10.0, 12.0),
            keyword(100.0, 100.4),
            energy(90.0, 95.0),
        ];
        let candidates = extractor().extract(&hits, 300.0);
        assert!(candidates.len() >= 2);
        for pair in candidates.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_window_clamped_at_video_start() {
        let candidates = extractor().extract(&[energy(1.0, 3.0)], 300.0);
        assert_eq!(candidates[0].start, 0.0);
        assert!((candidates[0].end - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_edges_snap_to_adjacent_silence() {
        let hits = vec![
            energy(100.0, 115.0),
            SignalHit::new(SignalKind::Silence, 98.0, 99.0, 1.0),
            SignalHit::new(SignalKind::Silence, 116.0, 117.0, 1.0),
        ];
        let candidates = extractor().extract(&hits, 300.0);
        assert_eq!(candidates[0].start, 99.0);
        assert_eq!(candidates[0].end, 116.0);
        assert_eq!(candidates[0].hits_of(SignalKind::Silence).count(), 2);
    }

    #[test]
    fn test_absorption_respects_max_length() {
        let config = ExtractorConfig::default().with_lengths(1.0, 10.0);
        let hits = vec![energy(100.0, 108.0), keyword(110.0, 110.5)];
        let candidates = CandidateExtractor::new(config, SignalPolicy::default()).extract(&hits, 300.0);

        let seed = candidates.iter().find(|c| c.has_kind(SignalKind::Energy)).unwrap();
        assert!(seed.duration() <= 10.0 + 1e-9);
    }

    #[test]
    fn test_strongest_hit_listed_first() {
        let hits = vec![keyword(120.5, 121.0), energy(120.0, 126.0)];
        let candidates = extractor().extract(&hits, 300.0);
        // energy 0.30 * 0.9 = 0.27 beats keyword 0.35 * 0.65 = 0.2275
        assert_eq!(candidates[0].contributing_hits[0].kind, SignalKind::Energy);
    }
}
