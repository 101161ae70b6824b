//! Offline training: labelled corpus in, fitted classifier and held-out accuracy out.

use std::{fs, path::Path};

use ki_erkenner_features::extractor::{FeatureVector, extract_features_batch};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    Classification,
    error::TrainingError,
    model::{Classifier, FitParams},
};

/// A text together with its known origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledExample {
    pub text: String,
    pub label: Classification,
}

impl LabeledExample {
    pub fn new(text: impl Into<String>, label: Classification) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

#[derive(Deserialize)]
struct CorpusRecord {
    text: String,
    label: String,
}

impl TryFrom<CorpusRecord> for LabeledExample {
    type Error = TrainingError;

    fn try_from(record: CorpusRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            label: record.label.parse()?,
            text: record.text,
        })
    }
}

/// Parse a corpus of `{"text": ..., "label": ...}` records.
///
/// Accepts a JSON array or one record per line (blank lines are skipped).
/// Labels are `"KI"` / `"Mensch"` (or `"ai"` / `"human"`).
pub fn parse_corpus(contents: &str) -> Result<Vec<LabeledExample>, TrainingError> {
    if contents.trim_start().starts_with('[') {
        let records: Vec<CorpusRecord> = serde_json::from_str(contents)
            .map_err(|source| TrainingError::InvalidRecord { line: 1, source })?;
        return records.into_iter().map(LabeledExample::try_from).collect();
    }

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let record: CorpusRecord =
                serde_json::from_str(line).map_err(|source| TrainingError::InvalidRecord {
                    line: index + 1,
                    source,
                })?;
            LabeledExample::try_from(record)
        })
        .collect()
}

pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<LabeledExample>, TrainingError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| TrainingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let corpus = parse_corpus(&contents)?;
    debug!(path = %path.display(), num_examples = corpus.len(), "Corpus loaded");
    Ok(corpus)
}

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn test_count(class_size: usize, test_size: f64) -> usize {
    if class_size < 2 {
        return 0;
    }
    // rounding cannot exceed class_size, and the clamp keeps one example on each side
    let count = (class_size as f64 * test_size).round() as usize;
    count.clamp(1, class_size - 1)
}

/// Stratified split: each class contributes `round(n_class · test_size)` test
/// rows, at least one and never all of them when the class has two or more.
///
/// Deterministic for a given `seed`. Both index lists are sorted.
pub fn stratified_split(
    labels: &[Classification],
    test_size: f64,
    seed: u64,
) -> Result<SplitIndices, TrainingError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TrainingError::InvalidTestSize(test_size));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = SplitIndices {
        train: Vec::with_capacity(labels.len()),
        test: Vec::new(),
    };

    for class in [Classification::Human, Classification::AI] {
        let mut members = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == class)
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        members.shuffle(&mut rng);
        let held_out = test_count(members.len(), test_size);
        split.test.extend_from_slice(&members[..held_out]);
        split.train.extend_from_slice(&members[held_out..]);
    }

    split.train.sort_unstable();
    split.test.sort_unstable();
    Ok(split)
}

/// Split examples into `(train, test)` with [`stratified_split`].
pub fn train_test_split(
    examples: &[LabeledExample],
    test_size: f64,
    seed: u64,
) -> Result<(Vec<LabeledExample>, Vec<LabeledExample>), TrainingError> {
    let labels = examples.iter().map(|e| e.label).collect::<Vec<_>>();
    let split = stratified_split(&labels, test_size, seed)?;
    let pick = |indices: &[usize]| -> Vec<LabeledExample> {
        indices.iter().map(|&i| examples[i].clone()).collect()
    };
    Ok((pick(&split.train), pick(&split.test)))
}

/// Share of correct predictions; `0.0` for an empty evaluation set.
#[must_use]
pub fn accuracy(
    classifier: &Classifier,
    features: &[FeatureVector],
    labels: &[Classification],
) -> f64 {
    let total = features.len().min(labels.len());
    if total == 0 {
        return 0.0;
    }
    let correct = features
        .iter()
        .zip(labels)
        .filter(|(features, label)| classifier.predict_features(features) == **label)
        .count();
    correct as f64 / total as f64
}

/// Training run settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub test_size: f64,
    pub seed: u64,
    pub fit: FitParams,
}

impl TrainingConfig {
    #[must_use]
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_fit_params(mut self, fit: FitParams) -> Self {
        self.fit = fit;
        self
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            fit: FitParams::default(),
        }
    }
}

/// Outcome of [`train`].
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub classifier: Classifier,
    pub train_size: usize,
    pub test_size: usize,
    /// Accuracy on the held-out split.
    pub accuracy: f64,
}

/// Extract features, split, fit on the training part and score the held-out part.
pub fn train(
    corpus: &[LabeledExample],
    config: &TrainingConfig,
) -> Result<TrainingReport, TrainingError> {
    info!(num_examples = corpus.len(), "Extracting features");
    let texts = corpus.iter().map(|e| e.text.as_str()).collect::<Vec<_>>();
    let features = extract_features_batch(&texts);
    let labels = corpus.iter().map(|e| e.label).collect::<Vec<_>>();

    let split = stratified_split(&labels, config.test_size, config.seed)?;
    let gather = |indices: &[usize]| -> (Vec<FeatureVector>, Vec<Classification>) {
        indices.iter().map(|&i| (features[i], labels[i])).unzip()
    };
    let (train_features, train_labels) = gather(&split.train);
    let (test_features, test_labels) = gather(&split.test);

    info!(
        train_size = train_features.len(),
        test_size = test_features.len(),
        "Fitting classifier"
    );
    let classifier = Classifier::fit_features(&train_features, &train_labels, &config.fit)?;

    if test_features.is_empty() {
        warn!("Held-out split is empty, accuracy reported as 0.0");
    }
    let accuracy = accuracy(&classifier, &test_features, &test_labels);
    info!(accuracy, "Training complete");

    Ok(TrainingReport {
        classifier,
        train_size: train_features.len(),
        test_size: test_features.len(),
        accuracy,
    })
}
