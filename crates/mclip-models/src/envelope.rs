//! Audio energy envelope.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One loudness measurement; `timestamp` is the centre of the analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnergySample {
    pub timestamp: f64,
    /// RMS level in dBFS (0 is full scale)
    pub level_db: f64,
}

impl EnergySample {
    pub fn new(timestamp: f64, level_db: f64) -> Self {
        Self { timestamp, level_db }
    }

    /// Linear amplitude in `[0, 1]` for a dBFS level.
    pub fn amplitude(&self) -> f64 {
        10f64.powf(self.level_db / 20.0)
    }
}

/// Time-indexed loudness at a fixed analysis rate.
///
/// Immutable once built. Timestamp monotonicity is checked by the analyzers,
/// not here, so malformed envelopes can still be represented and rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioEnergyEnvelope {
    window_secs: f64,
    samples: Vec<EnergySample>,
}

impl AudioEnergyEnvelope {
    pub fn new(window_secs: f64, samples: Vec<EnergySample>) -> Self {
        Self {
            window_secs,
            samples,
        }
    }

    /// Analysis window length in seconds.
    pub fn window_secs(&self) -> f64 {
        self.window_secs
    }

    pub fn samples(&self) -> &[EnergySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Covered duration: last sample centre plus half a window.
    pub fn duration(&self) -> f64 {
        self.samples
            .last()
            .map(|s| s.timestamp + self.window_secs / 2.0)
            .unwrap_or(0.0)
    }

    /// Index of the first sample whose timestamp does not increase.
    pub fn first_non_increasing(&self) -> Option<usize> {
        self.samples
            .windows(2)
            .position(|pair| !(pair[1].timestamp > pair[0].timestamp))
            .map(|i| i + 1)
    }
}
