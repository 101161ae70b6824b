//! Fixed word lists the lexicon features are counted against.
//!
//! Trained weights are aligned to exactly these entries. Changing any of them
//! invalidates every previously trained model.

/// German discourse fillers.
pub const FILLER_WORDS: [&str; 12] = [
    "also",
    "halt",
    "naja",
    "irgendwie",
    "sozusagen",
    "quasi",
    "eigentlich",
    "ok",
    "äh",
    "mh",
    "ach",
    "nun",
];

/// First and second person German pronouns.
pub const PERSONAL_PRONOUNS: [&str; 8] = ["ich", "du", "wir", "uns", "euch", "dir", "mich", "dich"];

/// Auxiliaries that usually mark a passive construction.
pub const PASSIVE_MARKERS: [&str; 3] = ["wird", "wurden", "worden"];

/// Classic ASCII emoticons, matched case-sensitively against the original text.
///
/// Alternation order matters: the matcher is leftmost-first, so `;-)` must be
/// tried before `;)`.
pub const EMOTICONS: [&str; 8] = [":)", ":(", ":^", "^_^", ";-)", ";)", ":D", "xD"];

#[inline]
pub(crate) fn is_filler_word(word: &str) -> bool {
    FILLER_WORDS.contains(&word)
}

#[inline]
pub(crate) fn is_personal_pronoun(word: &str) -> bool {
    PERSONAL_PRONOUNS.contains(&word)
}

#[inline]
pub(crate) fn is_passive_marker(word: &str) -> bool {
    PASSIVE_MARKERS.contains(&word)
}
