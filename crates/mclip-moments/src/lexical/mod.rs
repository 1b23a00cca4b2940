//! Lexical signal detection over transcript segments.
//!
//! Two detectors share one [`KeywordTaxonomy`]:
//! - [`HookDetector`] scores question framing, direct address, hook phrases and opener cues
//! - [`StatementAnalyzer`] finds keyword categories, numeric claims and strong statements

pub mod hook;
pub mod statement;
pub mod taxonomy;

use std::sync::Arc;

use mclip_models::{SignalHit, SignalPolicy, Transcript, Word};

pub use hook::{HookDetector, HookScore};
pub use statement::{StatementAnalyzer, StatementStrength};
pub use taxonomy::{KeywordTaxonomy, TermMatch};

/// Normalized tokens for a word run.
pub(crate) fn tokens(words: &[Word]) -> Vec<String> {
    words.iter().map(Word::normalized).collect()
}

/// Runs both lexical detectors.
#[derive(Debug, Clone)]
pub struct LexicalDetector {
    hook: HookDetector,
    statement: StatementAnalyzer,
}

impl LexicalDetector {
    pub fn new(taxonomy: KeywordTaxonomy, policy: SignalPolicy, hook_window_secs: f64) -> Self {
        let taxonomy = Arc::new(taxonomy);
        Self {
            hook: HookDetector::new(Arc::clone(&taxonomy), hook_window_secs),
            statement: StatementAnalyzer::new(taxonomy, policy),
        }
    }

    pub fn hook(&self) -> &HookDetector {
        &self.hook
    }

    pub fn statement(&self) -> &StatementAnalyzer {
        &self.statement
    }

    /// All hook, keyword and statement hits, ordered by start.
    pub fn detect(&self, transcript: &Transcript) -> Vec<SignalHit> {
        let mut hits = self.hook.detect(transcript);
        hits.extend(self.statement.detect(transcript));
        hits.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mclip_models::SignalKind;

    #[test]
    fn test_detect_merges_and_orders() {
        let words = vec![
            Word::new("We", 0.0, 0.2),
            Word::new("won.", 0.3, 0.6),
            Word::new("Would", 5.0, 5.2),
            Word::new("you", 5.3, 5.5),
            Word::new("believe", 5.6, 5.9),
            Word::new("it?", 6.0, 6.2),
        ];
        let transcript = Transcript::new(words).unwrap();
        let detector = LexicalDetector::new(KeywordTaxonomy::default(), SignalPolicy::default(), 3.0);

        let hits = detector.detect(&transcript);
        assert!(hits.windows(2).all(|w| w[0].start <= w[1].start));
        assert_eq!(hits[0].kind, SignalKind::Keyword);
        assert!(hits.iter().any(|h| h.kind == SignalKind::Hook && h.start == 5.0));
    }
}
