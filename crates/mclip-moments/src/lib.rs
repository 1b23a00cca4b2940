//! Transcript-side analysis and signal fusion.
//!
//! This crate provides:
//! - Word boundary lookup over a transcript ([`WordAligner`])
//! - Lexical hook, keyword and statement detection ([`LexicalDetector`])
//! - Candidate extraction from fused signal hits ([`CandidateExtractor`])
//! - Boundary snapping, length repair and weak-hook rejection ([`MomentFilter`])
//! - Batched provider scoring with local fallback ([`MomentScorer`])
//! - Greedy non-overlapping selection ([`MomentSelector`])

pub mod aligner;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod lexical;
pub mod scorer;
pub mod selector;

pub use aligner::{AlignerConfig, Direction, WordAligner, WordBoundary};
pub use error::{BoundaryError, BoundaryResult};
pub use extractor::{CandidateExtractor, ExtractorConfig};
pub use filter::{FilterConfig, FilterContext, FilterOutcome, MomentFilter, TrimPolicy};
pub use lexical::{HookDetector, HookScore, KeywordTaxonomy, LexicalDetector, StatementAnalyzer, StatementStrength};
pub use scorer::{LocalProvider, LocalScorer, MomentScorer, ScorerConfig, ScoringOutcome, ScoringWarning};
pub use selector::{MomentSelector, SelectorConfig};
