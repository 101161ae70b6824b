//! Flesch Reading Ease on its own counting path.
//!
//! The counts here follow the readability library the feature was originally
//! computed with, not the extractor's tokenizers: sentences are word-initial
//! segments ending in terminators, short segments are ignored and punctuation
//! is stripped before counting words. Syllables are hyphenation points of the
//! en-US Liang patterns plus one per word. Trained weights depend on these
//! rules.

use std::borrow::Cow;
use std::sync::LazyLock;

use hyphenation::{Hyphenator, Language, Load, Standard};
use regex::Regex;

/// The constant term of the formula.
pub const FLESCH_BASE: f64 = 206.835;
/// Score of a text without words: [`FLESCH_BASE`] rounded to two decimals.
pub const EMPTY_TEXT_SCORE: f64 = 206.84;
const SENTENCE_LENGTH_WEIGHT: f64 = 1.015;
const SYLLABLES_PER_WORD_WEIGHT: f64 = 84.6;
const SCORE_DECIMALS: i32 = 2;

/// Segments with at most this many words do not count as sentences.
const MIN_SENTENCE_WORDS: usize = 2;

/// Hyphenation points closer than this to either end of a word are not counted.
const HYPHENATION_MINIMA: (usize, usize) = (2, 2);

/// Endings after which an apostrophe belongs to a contraction and is kept.
const CONTRACTION_SUFFIXES: [&str; 6] = ["t", "s", "d", "ve", "ll", "re"];

static SENTENCE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[^.!?]+[.!?]*").expect("sentence segment pattern is valid"));

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}_\s']").expect("punctuation pattern is valid"));

static EN_US: LazyLock<Standard> = LazyLock::new(|| {
    let mut dictionary = Standard::from_embedded(Language::EnglishUS)
        .expect("embedded en-US hyphenation patterns load");
    dictionary.minima = HYPHENATION_MINIMA;
    dictionary
});

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn starts_contraction_suffix(rest: &str) -> bool {
    CONTRACTION_SUFFIXES.iter().any(|suffix| {
        rest.strip_prefix(*suffix)
            .is_some_and(|after| !after.starts_with(is_word_char))
    })
}

/// Drop apostrophes that are not part of a contraction such as `it's`.
fn drop_quote_apostrophes(text: &str) -> Cow<'_, str> {
    if !text.contains('\'') {
        return Cow::Borrowed(text);
    }
    text.char_indices()
        .filter(|&(index, c)| c != '\'' || starts_contraction_suffix(&text[index + 1..]))
        .map(|(_, c)| c)
        .collect()
}

/// Remove everything except word characters, whitespace and contraction apostrophes.
pub fn strip_punctuation(text: &str) -> String {
    PUNCTUATION
        .replace_all(&drop_quote_apostrophes(text), "")
        .into_owned()
}

/// Whitespace separated words after punctuation removal.
pub fn lexicon_count(text: &str) -> usize {
    strip_punctuation(text).split_whitespace().count()
}

/// Number of sentences, never less than one.
pub fn sentence_count(text: &str) -> usize {
    let (segments, ignored) = SENTENCE_SEGMENT
        .find_iter(text)
        .fold((0usize, 0usize), |(segments, ignored), segment| {
            let short = lexicon_count(segment.as_str()) <= MIN_SENTENCE_WORDS;
            (segments + 1, ignored + usize::from(short))
        });
    segments.saturating_sub(ignored).max(1)
}

fn lowercase_word_syllables(word: &str) -> usize {
    EN_US.hyphenate(word).breaks.len() + 1
}

/// Hyphenation points of a single word plus one.
pub fn word_syllables(word: &str) -> usize {
    lowercase_word_syllables(&word.to_lowercase())
}

pub fn syllable_count(text: &str) -> usize {
    strip_punctuation(&text.to_lowercase())
        .split_whitespace()
        .map(lowercase_word_syllables)
        .sum()
}

/// Round half away from zero to `decimals` places.
fn legacy_round(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale + 0.5f64.copysign(value)).floor() / scale
}

/// Raw counts the formula is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadabilityCounts {
    pub sentences: usize,
    pub words: usize,
    pub syllables: usize,
}

impl ReadabilityCounts {
    pub fn from_text(text: &str) -> Self {
        Self {
            sentences: sentence_count(text),
            words: lexicon_count(text),
            syllables: syllable_count(text),
        }
    }

    fn average_sentence_length(&self) -> f64 {
        if self.sentences == 0 {
            return 0.0;
        }
        self.words as f64 / self.sentences as f64
    }

    fn average_syllables_per_word(&self) -> f64 {
        if self.words == 0 {
            return 0.0;
        }
        self.syllables as f64 / self.words as f64
    }

    /// Score rounded to two decimals. Both averages are guarded against
    /// division by zero, so the result is always finite.
    pub fn flesch_reading_ease(&self) -> f64 {
        let score = FLESCH_BASE
            - SENTENCE_LENGTH_WEIGHT * self.average_sentence_length()
            - SYLLABLES_PER_WORD_WEIGHT * self.average_syllables_per_word();
        legacy_round(score, SCORE_DECIMALS)
    }
}

/// Flesch Reading Ease of `text`; higher is easier to read.
pub fn flesch_reading_ease(text: &str) -> f64 {
    ReadabilityCounts::from_text(text).flesch_reading_ease()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn empty_text_scores_the_rounded_base_constant() {
        assert_close(legacy_round(FLESCH_BASE, SCORE_DECIMALS), EMPTY_TEXT_SCORE);
        assert_close(flesch_reading_ease(""), EMPTY_TEXT_SCORE);
        assert_close(flesch_reading_ease("???"), EMPTY_TEXT_SCORE);
    }

    #[test]
    fn empty_text_counts() {
        assert_eq!(
            ReadabilityCounts::from_text(""),
            ReadabilityCounts {
                sentences: 1,
                words: 0,
                syllables: 0,
            }
        );
    }

    #[test]
    fn short_segments_are_not_sentences() {
        // "Ja." and "Gut." are ignored, the long sentence remains
        assert_eq!(sentence_count("Ja. Das ist ein langer Satz. Gut."), 1);
        assert_eq!(
            sentence_count("Das ist der erste Satz. Das ist der zweite Satz!"),
            2
        );
    }

    #[test]
    fn punctuation_is_removed_before_counting_words() {
        assert_eq!(lexicon_count("Hallo, Welt - wie geht's?"), 4);
    }

    #[test]
    fn only_contraction_apostrophes_survive() {
        assert_eq!(strip_punctuation("geht's 'los'"), "geht's los");
        assert_eq!(strip_punctuation("you've we'll they're"), "you've we'll they're");
    }

    #[test]
    fn combining_marks_are_punctuation() {
        assert_eq!(strip_punctuation("mu\u{0308}de"), "mude");
    }

    #[test]
    fn syllables_are_hyphenation_points_plus_one() {
        assert_eq!(word_syllables("hyphenation"), 3);
        assert_eq!(word_syllables("Hyphenation"), 3);
    }

    #[test]
    fn short_words_have_one_syllable() {
        for word in ["der", "und", "ist", "da", "42", "a"] {
            assert_eq!(word_syllables(word), 1, "{word}");
        }
    }

    #[test]
    fn known_score() {
        // every word is too short to hyphenate
        let text = "Wir und ihr sie und der Ast.";
        let counts = ReadabilityCounts::from_text(text);
        assert_eq!(
            counts,
            ReadabilityCounts {
                sentences: 1,
                words: 7,
                syllables: 7,
            }
        );
        assert_close(flesch_reading_ease(text), 115.13);
    }

    #[test]
    fn score_is_rounded_to_two_decimals() {
        let text = "Wir und ihr sie. Da ist er. Und der Ast.";
        let counts = ReadabilityCounts::from_text(text);
        assert_eq!(
            counts,
            ReadabilityCounts {
                sentences: 3,
                words: 10,
                syllables: 10,
            }
        );
        // unrounded 118.85166...
        assert_close(counts.flesch_reading_ease(), 118.85);
    }

    #[test]
    fn rounding_goes_half_away_from_zero() {
        assert_close(legacy_round(0.125, 2), 0.13);
        assert_close(legacy_round(-0.125, 2), -0.13);
        assert_close(legacy_round(1.004, 2), 1.0);
    }

    #[test]
    fn score_is_finite_for_extreme_counts() {
        let extremes = [
            ReadabilityCounts {
                sentences: 0,
                words: 0,
                syllables: 0,
            },
            ReadabilityCounts {
                sentences: 1,
                words: 1,
                syllables: usize::MAX,
            },
            ReadabilityCounts {
                sentences: 1,
                words: usize::MAX,
                syllables: 0,
            },
        ];
        for counts in extremes {
            assert!(counts.flesch_reading_ease().is_finite(), "{counts:?}");
        }
    }

    #[test]
    fn longer_words_read_harder() {
        let simple = flesch_reading_ease("Der Hund ist hier und spielt gern.");
        let complex = flesch_reading_ease(
            "The implementation requires comprehensive documentation and considerable preparation.",
        );
        assert!(simple > complex);
    }
}
