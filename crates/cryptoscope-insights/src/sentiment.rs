//! Lexicon sentiment for crypto-community mentions.

use cryptoscope_core::{Mention, Sentiment};

/// Word weights for crypto social chatter.
///
/// Keys are lowercase single words. Positive weights in `(0.0, 1.0]`,
/// negative in `[-1.0, 0.0)`. The summed score is clamped to `[-1.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f32)] = &[
    ("bullish", 0.5),
    ("moon", 0.4),
    ("mooning", 0.5),
    ("gem", 0.4),
    ("alpha", 0.3),
    ("legit", 0.4),
    ("great", 0.4),
    ("good", 0.3),
    ("love", 0.5),
    ("best", 0.5),
    ("based", 0.3),
    ("wagmi", 0.5),
    ("lfg", 0.5),
    ("thanks", 0.3),
    ("amazing", 0.5),
    ("insightful", 0.4),
    ("huge", 0.3),
    ("pump", 0.2),
    ("win", 0.4),
    ("bearish", -0.5),
    ("scam", -0.8),
    ("scammer", -0.8),
    ("rug", -0.8),
    ("rugged", -0.8),
    ("ponzi", -0.7),
    ("fud", -0.4),
    ("dump", -0.4),
    ("dumping", -0.5),
    ("rekt", -0.5),
    ("ngmi", -0.5),
    ("fake", -0.6),
    ("hack", -0.6),
    ("hacked", -0.7),
    ("exploit", -0.6),
    ("bad", -0.4),
    ("terrible", -0.6),
    ("worst", -0.6),
    ("shill", -0.4),
    ("grift", -0.6),
    ("liar", -0.7),
];

/// Scores above this label a mention positive, below its negation negative.
const LABEL_THRESHOLD: f32 = 0.1;

/// Score text against the crypto lexicon.
///
/// Splits on whitespace, strips non-alphabetic edges, lowercases, and sums
/// matching weights. Returns `0.0` for empty or unknown text.
#[must_use]
pub fn lexicon_score(text: &str) -> f32 {
    let mut score = 0.0_f32;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        if let Some(&(_, weight)) = LEXICON.iter().find(|(lex_word, _)| *lex_word == w) {
            score += weight;
        }
    }
    score.clamp(-1.0, 1.0)
}

/// Label a mention's text for storage at ingestion time.
#[must_use]
pub fn classify_mention(text: &str) -> Sentiment {
    let score = lexicon_score(text);
    if score > LABEL_THRESHOLD {
        Sentiment::Positive
    } else if score < -LABEL_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Mentions whose text contains any keyword, case-insensitively.
///
/// Blank keywords are ignored; with no usable keywords nothing matches.
#[must_use]
pub fn filter_by_keywords<'a>(mentions: &'a [Mention], keywords: &[String]) -> Vec<&'a Mention> {
    let needles: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if needles.is_empty() {
        return Vec::new();
    }

    mentions
        .iter()
        .filter(|m| {
            let haystack = m.text.to_lowercase();
            needles.iter().any(|n| haystack.contains(n.as_str()))
        })
        .collect()
}
