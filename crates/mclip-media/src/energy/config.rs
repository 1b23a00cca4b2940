//! Configuration for energy spike detection.

use serde::{Deserialize, Serialize};

use crate::env_f64;

/// Configuration for [`EnergyAnalyzer`](super::EnergyAnalyzer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Multiplier over the rolling baseline that marks a spike.
    pub spike_sensitivity: f64,

    /// Length of the centred moving-average window (seconds).
    ///
    /// Should be several times the minimum clip length so a spike does not
    /// raise its own baseline.
    pub baseline_window_secs: f64,

    /// Hot runs separated by at most this gap are merged (seconds).
    pub coalesce_gap_secs: f64,

    /// Runs shorter than this are discarded (seconds).
    pub min_spike_secs: f64,

    /// Absolute level a sample must exceed to count as hot (dBFS).
    ///
    /// Keeps relative spikes in near-silent stretches (room tone, breaths)
    /// from becoming hits. Env: `MCLIP_MIN_SPIKE_LEVEL_DB`.
    pub min_level_db: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            spike_sensitivity: 1.5,
            baseline_window_secs: 60.0,
            coalesce_gap_secs: 1.0,
            min_spike_secs: 0.5,
            min_level_db: -45.0,
        }
    }
}

impl EnergyConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            spike_sensitivity: env_f64("MCLIP_SPIKE_SENSITIVITY", defaults.spike_sensitivity).max(1.0),
            baseline_window_secs: env_f64("MCLIP_BASELINE_WINDOW_SECS", defaults.baseline_window_secs),
            coalesce_gap_secs: env_f64("MCLIP_COALESCE_GAP_SECS", defaults.coalesce_gap_secs),
            min_spike_secs: env_f64("MCLIP_MIN_SPIKE_SECS", defaults.min_spike_secs),
            min_level_db: env_f64("MCLIP_MIN_SPIKE_LEVEL_DB", defaults.min_level_db),
        }
    }

    /// Builder-style setter for spike sensitivity; values below 1.0 are raised to 1.0.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.spike_sensitivity = sensitivity.max(1.0);
        self
    }

    pub fn with_baseline_window_secs(mut self, secs: f64) -> Self {
        self.baseline_window_secs = secs;
        self
    }

    pub fn with_coalesce_gap_secs(mut self, secs: f64) -> Self {
        self.coalesce_gap_secs = secs.max(0.0);
        self
    }

    pub fn with_min_spike_secs(mut self, secs: f64) -> Self {
        self.min_spike_secs = secs.max(0.0);
        self
    }

    pub fn with_min_level_db(mut self, level_db: f64) -> Self {
        self.min_level_db = level_db;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EnergyConfig::default();
        assert!((config.spike_sensitivity - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.baseline_window_secs, 60.0);
    }

    #[test]
    fn test_sensitivity_floor() {
        let config = EnergyConfig::default().with_sensitivity(0.4);
        assert_eq!(config.spike_sensitivity, 1.0);
    }
}
