//! # ki-erkenner-features
//!
//! Turns a piece of free text into the nine stylometric features the
//! `ki-erkenner` classifier was trained on.
//!
//! ```rust
//! use ki_erkenner_features::extractor::{FEATURE_COUNT, extract_features};
//!
//! let features = extract_features("Ich glaube, das stimmt. Wirklich?");
//! assert_eq!(features.to_array().len(), FEATURE_COUNT);
//! ```

pub mod extractor;
