//! Energy spike detection.
//!
//! ```text
//! envelope (dBFS) ──► amplitude ──► centred moving average (baseline)
//!                                         │
//!                        amplitude > baseline × sensitivity ?
//!                                         │
//!                     hot runs ──► coalesce gaps ──► SignalHit{energy}
//! ```

mod analyzer;
mod config;

pub use analyzer::EnergyAnalyzer;
pub use config::EnergyConfig;
