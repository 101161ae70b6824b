//! Per-feature computations over pre-tokenized input.
//!
//! Every function returns `0.0` when its denominator would be empty.

use ahash::{HashMap, HashMapExt, HashSet};

use super::lexicon;

/// Mean of the per-sentence word counts.
pub fn average_sentence_length(word_counts: &[usize]) -> f64 {
    if word_counts.is_empty() {
        return 0.0;
    }
    word_counts.iter().sum::<usize>() as f64 / word_counts.len() as f64
}

/// Population variance of the per-sentence word counts.
pub fn variance_sentence_length(word_counts: &[usize]) -> f64 {
    if word_counts.is_empty() {
        return 0.0;
    }
    let mean = average_sentence_length(word_counts);
    word_counts
        .iter()
        .map(|&count| {
            let delta = count as f64 - mean;
            delta * delta
        })
        .sum::<f64>()
        / word_counts.len() as f64
}

/// Share of distinct words that occur more than once.
pub fn repeated_words_ratio(words: &[&str]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let mut counts = HashMap::with_capacity(words.len());
    for &word in words {
        *counts.entry(word).or_insert(0usize) += 1;
    }
    let repeated = counts.values().filter(|&&count| count > 1).count();
    repeated as f64 / counts.len() as f64
}

/// Distinct words over total words.
pub fn type_token_ratio(words: &[&str]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let distinct = words.iter().collect::<HashSet<_>>().len();
    distinct as f64 / words.len() as f64
}

fn lexicon_ratio(words: &[&str], in_lexicon: impl Fn(&str) -> bool) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let hits = words.iter().filter(|&&word| in_lexicon(word)).count();
    hits as f64 / words.len() as f64
}

pub fn filler_word_ratio(words: &[&str]) -> f64 {
    lexicon_ratio(words, lexicon::is_filler_word)
}

pub fn personal_pronoun_ratio(words: &[&str]) -> f64 {
    lexicon_ratio(words, lexicon::is_personal_pronoun)
}

pub fn passive_indicator_ratio(words: &[&str]) -> f64 {
    lexicon_ratio(words, lexicon::is_passive_marker)
}

/// Emoticons per word run of the original-case text.
pub fn emoji_ratio(emoticon_count: usize, word_run_count: usize) -> f64 {
    if word_run_count == 0 {
        return 0.0;
    }
    emoticon_count as f64 / word_run_count as f64
}
