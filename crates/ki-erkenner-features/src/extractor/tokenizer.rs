//! The tokenizations the extractor works with.
//!
//! Sentence lengths use a plain whitespace split of each sentence, while the
//! lexicon features use maximal runs of word characters. The two disagree on
//! punctuation: `"glaube,"` is one whitespace token but the word run `glaube`.
//! Both behaviours are part of the trained feature semantics and must stay
//! separate.
//!
//! Word characters are letters, numbers and `_`. Combining marks are not word
//! characters, so a decomposed umlaut splits its word.

use std::sync::LazyLock;

use regex::Regex;

use super::lexicon::EMOTICONS;

static WORD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}_]+").expect("word run pattern is valid"));

static EMOTICON: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = EMOTICONS
        .iter()
        .map(|emoticon| regex::escape(emoticon))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).expect("emoticon pattern is valid")
});

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Split on every `.`, `!` or `?`, trimming each piece and dropping empty ones.
pub fn sentences(text: &str) -> Vec<&str> {
    text.split(SENTENCE_TERMINATORS)
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Whitespace-separated token count of every sentence.
///
/// Punctuation stays attached to its token, so `"Ich glaube, das stimmt"`
/// counts four words.
pub fn sentence_word_counts(text: &str) -> Vec<usize> {
    sentences(text)
        .into_iter()
        .map(|sentence| sentence.split_whitespace().count())
        .collect()
}

/// Maximal runs of word characters. Pass lowercased text for lexicon lookups.
pub fn word_runs(text: &str) -> Vec<&str> {
    WORD_RUN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Number of word runs in `text`, without collecting them.
pub fn word_run_count(text: &str) -> usize {
    WORD_RUN.find_iter(text).count()
}

/// Non-overlapping emoticon occurrences, case-sensitive.
pub fn emoticon_count(text: &str) -> usize {
    EMOTICON.find_iter(text).count()
}

/// Everything the non-readability features need, tokenized once.
#[derive(Debug, Clone)]
pub(crate) struct TokenizedText {
    pub sentence_word_counts: Vec<usize>,
    lowered: String,
    pub word_run_count: usize,
    pub emoticon_count: usize,
}

impl TokenizedText {
    pub fn new(text: &str) -> Self {
        Self {
            sentence_word_counts: sentence_word_counts(text),
            lowered: text.to_lowercase(),
            word_run_count: word_run_count(text),
            emoticon_count: emoticon_count(text),
        }
    }

    /// Lowercased word runs used for every lexicon based feature.
    pub fn words(&self) -> Vec<&str> {
        word_runs(&self.lowered)
    }
}
