//! # ki-erkenner
//!
//! Classifies German text as more likely written by an AI or by a human.
//!
//! Each text is reduced to nine interpretable stylometric features (sentence
//! length statistics, lexical diversity, readability and a few lexicon ratios)
//! which a logistic regression model scores.
//!
//! ## Quick Start
//!
//! ```rust
//! use ki_erkenner::{Classification, Classifier, Detector, LogisticModel};
//!
//! // weights are positionally aligned to `FEATURE_NAMES`
//! let model = LogisticModel::new([0.0, 0.0, 0.0, 0.0, 0.0, -8.0, -4.0, 6.0, -5.0], 0.5);
//! let detector = Detector::new(Classifier::new(model)?);
//!
//! let prediction = detector.predict("Das Verfahren wird sorgfältig geprüft.");
//! println!("AI probability: {:.2}%", prediction.ai_probability() * 100.0);
//! assert_eq!(detector.classify("Das Verfahren wird sorgfältig geprüft."), Classification::AI);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Training
//!
//! ```rust
//! use ki_erkenner::training::{LabeledExample, TrainingConfig, train};
//! use ki_erkenner::Classification::{AI, Human};
//!
//! let corpus = vec![
//!     LabeledExample::new("Naja, ich find das halt gut.", Human),
//!     LabeledExample::new("Ach, ok, dann machen wir das halt so :)", Human),
//!     LabeledExample::new("Die Ergebnisse wurden sorgfältig dokumentiert.", AI),
//!     LabeledExample::new("Eine umfassende Bewertung ist erforderlich.", AI),
//! ];
//! let report = train(&corpus, &TrainingConfig::default().with_test_size(0.5))?;
//! println!("Test-Genauigkeit: {:.2}", report.accuracy);
//! # Ok::<(), anyhow::Error>(())
//! ```

#[cfg(feature = "cli")]
pub mod cli;

pub mod error;
pub mod model;
mod pipeline;
pub mod training;

use std::path::Path;

use anyhow::Context;
pub use ki_erkenner_features::extractor::{
    FEATURE_COUNT, FEATURE_NAMES, FeatureVector, extract_features, extract_features_batch,
};
pub use model::{CLASSIFICATION_THRESHOLD, Classifier, FitParams, LogisticModel, MODEL_VERSION};
pub use pipeline::{Classification, Prediction};

/// Text in, prediction out: feature extraction followed by classification.
///
/// Holds only read-only model parameters, so one detector can serve many
/// threads at once.
///
/// # Examples
///
/// ```rust,no_run
/// use ki_erkenner::Detector;
///
/// let detector = Detector::from_model_file("model.json")?;
/// let prediction = detector.predict("some text");
/// let class = detector.classify("some text");
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Detector {
    classifier: Classifier,
}

impl Detector {
    #[must_use]
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    /// Load a model saved with [`LogisticModel::save`].
    pub fn from_model_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let classifier = Classifier::load(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;
        Ok(Self::new(classifier))
    }

    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Feature vector the prediction for `text` is based on.
    pub fn features<T: AsRef<str>>(&self, text: T) -> FeatureVector {
        extract_features(text.as_ref())
    }

    /// Predict probabilities for a single text.
    ///
    /// Returns a `Prediction` containing P(Human) and P(AI).
    pub fn predict<T: AsRef<str>>(&self, text: T) -> Prediction {
        self.classifier
            .predict_proba_features(&extract_features(text.as_ref()))
    }

    /// Predict probabilities for multiple texts, in input order.
    pub fn predict_batch<T: AsRef<str> + Sync>(&self, texts: &[T]) -> Vec<Prediction> {
        extract_features_batch(texts)
            .iter()
            .map(|features| self.classifier.predict_proba_features(features))
            .collect()
    }

    /// Classify a single text at [`CLASSIFICATION_THRESHOLD`].
    pub fn classify<T: AsRef<str>>(&self, text: T) -> Classification {
        self.predict(text).classification(CLASSIFICATION_THRESHOLD)
    }

    /// Classify multiple texts, in input order.
    pub fn classify_batch<T: AsRef<str> + Sync>(&self, texts: &[T]) -> Vec<Classification> {
        self.predict_batch(texts)
            .into_iter()
            .map(|pred| pred.classification(CLASSIFICATION_THRESHOLD))
            .collect()
    }
}
