//! Feature extraction: raw text to a fixed, ordered set of nine statistics.

pub mod lexicon;
mod metrics;
pub mod readability;
pub mod tokenizer;

use std::borrow::Cow;

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressIterator, ProgressStyle};
use rayon::prelude::*;
use tracing::debug;

pub use readability::{EMPTY_TEXT_SCORE, FLESCH_BASE};
use tokenizer::TokenizedText;

/// Length of every [`FeatureVector`].
pub const FEATURE_COUNT: usize = 9;

/// Feature names in positional order. Model weights are aligned to this order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "avg_sent_len",
    "var_sent_len",
    "repeated_ratio",
    "flesch_reading_ease",
    "type_token_ratio",
    "filler_word_ratio",
    "personal_pronoun_ratio",
    "passive_indicator_ratio",
    "emoji_ratio",
];

/// Minimum number of texts to consider parallelization
const MIN_TEXTS_FOR_PARALLEL: usize = 100;

/// Minimum total character count to consider parallelization
const MIN_CHARS_FOR_PARALLEL: usize = 10_000;

/// The nine stylometric features of one text.
///
/// Fields are declared in positional order; [`FeatureVector::to_array`] is the
/// only place the names are turned into positions.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector {
    /// Mean whitespace token count per sentence.
    pub avg_sentence_length: f64,
    /// Population variance of the whitespace token counts per sentence.
    pub var_sentence_length: f64,
    /// Share of distinct words occurring at least twice.
    pub repeated_words_ratio: f64,
    pub flesch_reading_ease: f64,
    /// Distinct words over total words.
    pub type_token_ratio: f64,
    pub filler_word_ratio: f64,
    pub personal_pronoun_ratio: f64,
    pub passive_indicator_ratio: f64,
    /// Emoticons per word run of the original text.
    pub emoji_ratio: f64,
}

impl FeatureVector {
    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.avg_sentence_length,
            self.var_sentence_length,
            self.repeated_words_ratio,
            self.flesch_reading_ease,
            self.type_token_ratio,
            self.filler_word_ratio,
            self.personal_pronoun_ratio,
            self.passive_indicator_ratio,
            self.emoji_ratio,
        ]
    }

    #[must_use]
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        let [
            avg_sentence_length,
            var_sentence_length,
            repeated_words_ratio,
            flesch_reading_ease,
            type_token_ratio,
            filler_word_ratio,
            personal_pronoun_ratio,
            passive_indicator_ratio,
            emoji_ratio,
        ] = values;
        Self {
            avg_sentence_length,
            var_sentence_length,
            repeated_words_ratio,
            flesch_reading_ease,
            type_token_ratio,
            filler_word_ratio,
            personal_pronoun_ratio,
            passive_indicator_ratio,
            emoji_ratio,
        }
    }

    /// `(name, value)` pairs in positional order.
    pub fn iter_named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.to_array())
    }
}

impl From<FeatureVector> for [f64; FEATURE_COUNT] {
    fn from(features: FeatureVector) -> Self {
        features.to_array()
    }
}

/// Extract the feature vector of a single text.
///
/// Never fails: empty or punctuation-only input yields `0.0` for every feature
/// except the Flesch score, which is [`EMPTY_TEXT_SCORE`] for text without words.
#[must_use]
pub fn extract_features(text: &str) -> FeatureVector {
    let tokens = TokenizedText::new(text);
    let words = tokens.words();

    FeatureVector {
        avg_sentence_length: metrics::average_sentence_length(&tokens.sentence_word_counts),
        var_sentence_length: metrics::variance_sentence_length(&tokens.sentence_word_counts),
        repeated_words_ratio: metrics::repeated_words_ratio(&words),
        flesch_reading_ease: readability::flesch_reading_ease(text),
        type_token_ratio: metrics::type_token_ratio(&words),
        filler_word_ratio: metrics::filler_word_ratio(&words),
        personal_pronoun_ratio: metrics::personal_pronoun_ratio(&words),
        passive_indicator_ratio: metrics::passive_indicator_ratio(&words),
        emoji_ratio: metrics::emoji_ratio(tokens.emoticon_count, tokens.word_run_count),
    }
}

fn progress_bar_setup(len: usize, message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .map_or_else(|_| ProgressStyle::default_bar(), |style| style.progress_chars("#>-")),
    );
    pb.set_message(message);
    pb
}

fn extract_texts_par<T: AsRef<str> + Sync>(texts: &[T]) -> Vec<FeatureVector> {
    debug!(num_texts = texts.len(), "Using parallel feature extraction");
    let pb = progress_bar_setup(texts.len(), "Extracting features in parallel");
    let result = texts
        .par_iter()
        .progress_with(pb.clone())
        .map(|text| extract_features(text.as_ref()))
        .collect();
    pb.finish_with_message("Parallel feature extraction complete");
    result
}

fn extract_texts<T: AsRef<str>>(texts: &[T]) -> Vec<FeatureVector> {
    debug!(num_texts = texts.len(), "Using sequential feature extraction");
    let pb = progress_bar_setup(texts.len(), "Extracting features");
    let result = texts
        .iter()
        .progress_with(pb.clone())
        .map(|text| extract_features(text.as_ref()))
        .collect();
    pb.finish_with_message("Feature extraction complete");
    result
}

/// Parallelize when there are many texts or the total character count is large.
#[inline]
fn should_use_parallel<T: AsRef<str>>(texts: &[T]) -> bool {
    if texts.len() >= MIN_TEXTS_FOR_PARALLEL {
        return true;
    }
    let total_chars: usize = texts.iter().map(|text| text.as_ref().len()).sum();
    total_chars >= MIN_CHARS_FOR_PARALLEL
}

/// Extract features for many texts, preserving input order.
///
/// Same output as mapping [`extract_features`] over `texts`.
pub fn extract_features_batch<T: AsRef<str> + Sync>(texts: &[T]) -> Vec<FeatureVector> {
    if should_use_parallel(texts) {
        extract_texts_par(texts)
    } else {
        extract_texts(texts)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn empty_text_is_all_zero_except_flesch() {
        let features = extract_features("");
        let expected = FeatureVector {
            flesch_reading_ease: EMPTY_TEXT_SCORE,
            ..FeatureVector::default()
        };
        assert_eq!(features, expected);
    }

    #[test]
    fn punctuation_only_text_does_not_fail() {
        let features = extract_features("???");
        assert_eq!(features.to_array().len(), FEATURE_COUNT);
        assert!(features.avg_sentence_length.abs() < f64::EPSILON);
        assert!(features.type_token_ratio.abs() < f64::EPSILON);
        assert!((features.flesch_reading_ease - EMPTY_TEXT_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn attached_comma_counts_as_part_of_a_word() {
        let features = extract_features("Ich glaube, das stimmt. Wirklich?");
        // whitespace tokens per sentence: [4, 1]
        assert_close(features.avg_sentence_length, 2.5);
        assert_close(features.var_sentence_length, 2.25);
        // five distinct words, none repeated
        assert_close(features.type_token_ratio, 1.0);
        assert_close(features.repeated_words_ratio, 0.0);
        assert_close(features.personal_pronoun_ratio, 1.0 / 5.0);
    }

    #[test]
    fn decomposed_umlaut_counts_as_two_word_runs() {
        let features = extract_features("Ich bin mu\u{0308}de und du auch");
        // ich, bin, mu, de, und, du, auch
        assert_close(features.personal_pronoun_ratio, 2.0 / 7.0);
        assert_close(features.type_token_ratio, 1.0);
    }

    #[test]
    fn one_filler_in_nine_words() {
        let features =
            extract_features("Das ist eigentlich ein recht kurzer Satz mit Wörtern.");
        assert_close(features.filler_word_ratio, 1.0 / 9.0);
    }

    #[test]
    fn lexicon_matching_is_case_insensitive() {
        let features = extract_features("Also WIRD es gemacht, ÄH, wird es.");
        // words: also wird es gemacht äh wird es
        assert_close(features.filler_word_ratio, 2.0 / 7.0);
        assert_close(features.passive_indicator_ratio, 2.0 / 7.0);
        // distinct: also wird es gemacht äh; repeated: wird es
        assert_close(features.repeated_words_ratio, 2.0 / 5.0);
        assert_close(features.type_token_ratio, 5.0 / 7.0);
    }

    #[test]
    fn emoticons_use_original_case() {
        let features = extract_features("Das war lustig xD wirklich :)");
        // word runs: Das war lustig xD wirklich
        assert_close(features.emoji_ratio, 2.0 / 5.0);
        let shouting = extract_features("Das war lustig XD wirklich");
        assert_close(shouting.emoji_ratio, 0.0);
    }

    #[test]
    fn array_round_trip_keeps_order() {
        let features = extract_features("Wir haben das halt gemacht. Es wird gut :D");
        let array = features.to_array();
        assert_close(array[0], features.avg_sentence_length);
        assert_close(array[3], features.flesch_reading_ease);
        assert_close(array[8], features.emoji_ratio);
        assert_eq!(FeatureVector::from_array(array), features);
    }

    #[test]
    fn named_iteration_matches_feature_names() {
        let features = extract_features("Naja, ich weiß nicht.");
        let names = features.iter_named().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, FEATURE_NAMES);
    }

    #[test]
    fn batch_matches_single_extraction() {
        let texts = vec![
            "Erster Text.".to_string(),
            String::new(),
            "Dritter Text, mit ;) Emoticon!".to_string(),
        ];
        let batch = extract_features_batch(&texts);
        let single = texts
            .iter()
            .map(|text| extract_features(text))
            .collect::<Vec<_>>();
        assert_eq!(batch, single);
    }

    #[test]
    fn parallel_batch_preserves_order() {
        let texts = (0..150)
            .map(|i| "Wort ".repeat(i % 7 + 1))
            .collect::<Vec<_>>();
        assert!(should_use_parallel(&texts));
        let batch = extract_features_batch(&texts);
        for (text, features) in texts.iter().zip(&batch) {
            assert_eq!(*features, extract_features(text));
        }
    }

    proptest! {
        #[test]
        fn features_are_always_finite(text in ".{0,200}") {
            let features = extract_features(&text);
            for (name, value) in features.iter_named() {
                prop_assert!(value.is_finite(), "{name} is not finite: {value}");
            }
        }

        #[test]
        fn ratios_stay_in_unit_interval(text in "[a-zA-ZäöüÄÖÜ .,!?:;)(^_-]{0,200}") {
            let features = extract_features(&text);
            for value in [
                features.repeated_words_ratio,
                features.type_token_ratio,
                features.filler_word_ratio,
                features.personal_pronoun_ratio,
                features.passive_indicator_ratio,
            ] {
                prop_assert!((0.0..=1.0).contains(&value));
            }
        }

        #[test]
        fn extraction_is_idempotent(text in ".{0,200}") {
            let first = extract_features(&text).to_array().map(f64::to_bits);
            let second = extract_features(&text).to_array().map(f64::to_bits);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn repeated_ratio_complements_singletons(words in proptest::collection::vec("[a-z]{1,4}", 1..40)) {
            let text = words.join(" ");
            let features = extract_features(&text);
            let mut counts = ahash::HashMap::default();
            for word in &words {
                *counts.entry(word.as_str()).or_insert(0usize) += 1;
            }
            let singletons = counts.values().filter(|&&count| count == 1).count();
            let expected = 1.0 - singletons as f64 / counts.len() as f64;
            prop_assert!((features.repeated_words_ratio - expected).abs() < 1e-12);
        }
    }
}
