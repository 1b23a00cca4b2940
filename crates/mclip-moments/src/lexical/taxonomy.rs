//! Keyword taxonomy and term matching over normalized tokens.

use std::sync::LazyLock;

use mclip_models::KeywordCategory;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Numeric claim: `40%`, `3x`, `10k`, `2.5m`, `1,000`.
static DATA_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d[\d,]*(?:\.\d+)?(%|x|k|m)?$").unwrap());

/// Words that turn a bare number into a claim.
const DATA_UNITS: &[&str] = &["percent", "times", "thousand", "million", "billion"];

/// Numbered-list opener: `3 ways`, `#1 mistake`, `number one reason`.
static LISTICLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|\s)(?:#?\d+|number one) (?:\w+ )?(?:ways|reasons|tips|secrets|facts|things|mistakes|steps|rules|lessons|mistake|reason|rule|lesson|thing)\b",
    )
    .unwrap()
});

/// Openings that pick up a thought from before the clip.
static MID_THOUGHT_OPENING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:so (?:i|we|he|she|they|you)\b|because\b|as i (?:said|mentioned)\b|going back to\b)").unwrap()
});

/// Openings that answer a question nobody asked.
static BARE_EXPLANATION_OPENING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:because|since|due to|as a result|therefore|thus|so|hence)\s").unwrap()
});

/// Openings that name a topic or problem outright.
static TOPIC_OPENING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:why|how|what|when|where|who)\b",
        r"|^(?:do you know|have you ever|did you know)\b",
        r"|^the (?:secret|truth|reality|key|problem|issue|thing) (?:is|to|about)\b",
        r"|^(?:here's|let me (?:tell|show|explain))\b",
        r"|\bthe (?:secret|truth|reality|key|problem|issue) (?:is|of|to)\b",
        r"|\b(?:actually|really|surprisingly|interestingly|basically)\b",
        r"|\b(?:one of the|the most|the best|the worst)\b",
    ))
    .unwrap()
});

/// Pronouns that need an antecedent the clip may have cut off.
pub const UNCLEAR_PRONOUNS: &[&str] = &["this", "that", "it", "they", "them", "these", "those"];

/// Words that carry no topic on their own.
pub const FILLER_WORDS: &[&str] = &["and", "the", "a", "or", "is", "are", "was", "were", "this", "that", "it", "be"];

/// A term found in a token sequence; indices are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermMatch {
    pub first: usize,
    pub last: usize,
    pub term: String,
}

/// Configured keyword lists.
///
/// Keyword categories feed the `keyword` signal; the hook cue lists feed
/// the hook score; the reference lists drive the filter's content rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTaxonomy {
    pub emotional: Vec<String>,
    pub action: Vec<String>,
    pub revelation: Vec<String>,
    pub hook_phrases: Vec<String>,
    /// Claims that go against received wisdom
    pub contrarian: Vec<String>,
    pub urgency: Vec<String>,
    /// Emotionally loaded words in an opening
    pub emotional_triggers: Vec<String>,
    /// Words that state a problem to be solved
    pub problem_terms: Vec<String>,
    /// References to something said before the clip
    pub context_phrases: Vec<String>,
    /// References to the show, episode or guest
    pub show_phrases: Vec<String>,
    /// Calls to subscribe, follow or visit
    pub branding_phrases: Vec<String>,
}

fn owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

impl Default for KeywordTaxonomy {
    fn default() -> Self {
        Self {
            emotional: owned(&[
                "amazing",
                "incredible",
                "shocking",
                "wow",
                "unbelievable",
                "crazy",
                "insane",
                "mind-blowing",
                "genius",
                "brilliant",
                "ridiculous",
            ]),
            action: owned(&[
                "happened",
                "crashed",
                "exploded",
                "collapsed",
                "destroyed",
                "broke",
                "failed",
                "succeeded",
                "won",
                "lost",
                "beat",
            ]),
            revelation: owned(&[
                "secret",
                "truth",
                "never knew",
                "didn't know",
                "find out",
                "discover",
                "revealed",
                "exposed",
                "turns out",
                "actually",
            ]),
            hook_phrases: owned(&[
                "what if",
                "imagine",
                "picture this",
                "have you ever",
                "did you know",
                "here's why",
                "the secret",
                "the truth",
                "watch this",
                "let me show you",
                "think about",
                "would you",
                "could you",
            ]),
            contrarian: owned(&[
                "nobody tells you",
                "no one tells you",
                "actually wrong",
                "everyone is wrong",
                "you're wrong",
                "you've been lied to",
                "stop doing",
                "is a myth",
                "the opposite",
                "unpopular opinion",
                "plot twist",
                "overrated",
            ]),
            urgency: owned(&[
                "right now",
                "today",
                "immediately",
                "hurry",
                "last chance",
                "before it's too late",
                "don't miss",
                "limited time",
            ]),
            emotional_triggers: owned(&[
                "love",
                "hate",
                "fear",
                "worry",
                "excited",
                "angry",
                "frustrated",
                "terrible",
                "best",
                "worst",
                "dangerous",
                "risky",
                "stupid",
            ]),
            problem_terms: owned(&[
                "why", "how", "what", "problem", "reason", "secret", "truth", "solution", "key", "mistake",
            ]),
            context_phrases: owned(&[
                "remember when",
                "as i said",
                "as we said",
                "earlier",
                "previously",
                "in this video",
                "in that video",
                "in this episode",
                "in that episode",
                "in this podcast",
                "in that podcast",
                "like i mentioned",
                "as discussed",
                "the other day",
                "last week",
                "last time",
            ]),
            show_phrases: owned(&[
                "on this show",
                "on the show",
                "on this podcast",
                "on the podcast",
                "on this episode",
                "on the episode",
                "my guest",
                "our guest",
                "the guest",
                "we're talking about",
                "we're talking with",
                "thanks for having",
                "thanks for joining",
            ]),
            branding_phrases: owned(&[
                "subscribe",
                "hit like",
                "comment below",
                "follow me",
                "follow us",
                "check out",
                "my channel",
                "my podcast",
                "my show",
                "my course",
                "link in bio",
                "link in description",
                "link in the description",
            ]),
        }
    }
}

impl KeywordTaxonomy {
    /// Word list for a category; data is pattern-matched and has none.
    pub fn terms(&self, category: KeywordCategory) -> &[String] {
        match category {
            KeywordCategory::Emotional => &self.emotional,
            KeywordCategory::Action => &self.action,
            KeywordCategory::Revelation => &self.revelation,
            KeywordCategory::Data => &[],
        }
    }

    /// Earliest match of `category` in `tokens`.
    pub fn find_first(&self, category: KeywordCategory, tokens: &[String]) -> Option<TermMatch> {
        if category == KeywordCategory::Data {
            return find_data(tokens);
        }

        let terms = self.terms(category);
        (0..tokens.len()).find_map(|i| {
            terms.iter().find_map(|term| {
                phrase_at(tokens, i, term).map(|last| TermMatch {
                    first: i,
                    last,
                    term: term.clone(),
                })
            })
        })
    }

    /// Hook phrases present anywhere in `tokens`, in list order.
    pub fn hook_phrases_in<'a>(&'a self, tokens: &'a [String]) -> impl Iterator<Item = &'a String> + 'a {
        self.hook_phrases
            .iter()
            .filter(move |phrase| find_phrase(tokens, phrase).is_some())
    }

    pub fn contrarian_in<'a>(&'a self, tokens: &[String]) -> Option<&'a String> {
        first_listed(&self.contrarian, tokens)
    }

    pub fn urgency_in<'a>(&'a self, tokens: &[String]) -> Option<&'a String> {
        first_listed(&self.urgency, tokens)
    }

    pub fn emotional_trigger_in<'a>(&'a self, tokens: &[String]) -> Option<&'a String> {
        first_listed(&self.emotional_triggers, tokens)
    }

    pub fn names_problem(&self, tokens: &[String]) -> bool {
        first_listed(&self.problem_terms, tokens).is_some()
    }

    pub fn context_reference_in<'a>(&'a self, tokens: &[String]) -> Option<&'a String> {
        first_listed(&self.context_phrases, tokens)
    }

    pub fn show_reference_in<'a>(&'a self, tokens: &[String]) -> Option<&'a String> {
        first_listed(&self.show_phrases, tokens)
    }

    pub fn branding_in<'a>(&'a self, tokens: &[String]) -> Option<&'a String> {
        first_listed(&self.branding_phrases, tokens)
    }
}

/// First entry of `list` present anywhere in `tokens`.
fn first_listed<'a>(list: &'a [String], tokens: &[String]) -> Option<&'a String> {
    list.iter().find(|phrase| find_phrase(tokens, phrase).is_some())
}

/// Numbered-list opener in space-joined tokens.
pub fn is_listicle(joined: &str) -> bool {
    LISTICLE.is_match(joined)
}

/// Opening continues a thought from before the clip.
pub fn starts_mid_thought(joined: &str) -> bool {
    MID_THOUGHT_OPENING.is_match(joined)
}

/// Opening launches straight into an explanation.
pub fn starts_bare_explanation(joined: &str) -> bool {
    BARE_EXPLANATION_OPENING.is_match(joined)
}

/// Opening states its topic or problem outright.
pub fn states_topic(joined: &str) -> bool {
    TOPIC_OPENING.is_match(joined)
}

/// Index of the last token if `phrase` matches starting at `i`.
fn phrase_at(tokens: &[String], i: usize, phrase: &str) -> Option<usize> {
    let mut last = i;
    for (offset, part) in phrase.split_whitespace().enumerate() {
        let token = tokens.get(i + offset)?;
        if token != part {
            return None;
        }
        last = i + offset;
    }
    Some(last)
}

/// Start index of the first occurrence of `phrase`.
pub(crate) fn find_phrase(tokens: &[String], phrase: &str) -> Option<usize> {
    (0..tokens.len()).find(|&i| phrase_at(tokens, i, phrase).is_some())
}

/// First numeric claim in `tokens`.
pub fn find_data(tokens: &[String]) -> Option<TermMatch> {
    tokens.iter().enumerate().find_map(|(i, token)| {
        let caps = DATA_TOKEN.captures(token)?;
        if caps.get(1).is_some() {
            return Some(TermMatch {
                first: i,
                last: i,
                term: token.clone(),
            });
        }
        let unit = tokens.get(i + 1).filter(|next| DATA_UNITS.contains(&next.as_str()))?;
        Some(TermMatch {
            first: i,
            last: i + 1,
            term: format!("{token} {unit}"),
        })
    })
}
