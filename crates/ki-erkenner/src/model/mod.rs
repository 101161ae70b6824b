//! Linear model with a logistic link over the nine extracted features.

mod fit;
mod math;
mod threshold;

use std::{fs, path::Path};

use ki_erkenner_features::extractor::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use fit::FitParams;
use math::{dot, sigmoid};
pub use threshold::CLASSIFICATION_THRESHOLD;

use crate::{
    error::{FitError, ModelError},
    pipeline::{Classification, Prediction},
};

/// Version of the model file format written by [`LogisticModel::save`].
pub const MODEL_VERSION: &str = "1.0.0";

fn default_model_version() -> String {
    MODEL_VERSION.to_string()
}

/// The learned parameters: one weight per feature plus a bias.
///
/// Feature names are stored next to the weights so that a model trained on a
/// different feature order is rejected on load instead of silently misaligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    #[serde(default = "default_model_version")]
    pub model_version: String,
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LogisticModel {
    #[must_use]
    pub fn new(weights: [f64; FEATURE_COUNT], bias: f64) -> Self {
        Self {
            model_version: default_model_version(),
            feature_names: FEATURE_NAMES.iter().map(ToString::to_string).collect(),
            weights: weights.to_vec(),
            bias,
        }
    }

    /// Validate that the model is structurally sound.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.weights.len() != FEATURE_COUNT {
            return Err(ModelError::DimensionMismatch {
                expected: FEATURE_COUNT,
                got: self.weights.len(),
            });
        }
        if !self.feature_names.iter().eq(FEATURE_NAMES.iter()) {
            return Err(ModelError::FeatureOrderMismatch {
                found: self.feature_names.clone(),
            });
        }
        // Check for NaN/Inf
        if let Some((index, &value)) = self.weights.iter().enumerate().find(|(_, w)| !w.is_finite())
        {
            return Err(ModelError::NonFiniteWeight { index, value });
        }
        if !self.bias.is_finite() {
            return Err(ModelError::NonFiniteBias(self.bias));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a model.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Model saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json(&json)?;
        debug!(path = %path.display(), version = %model.model_version, "Model loaded");
        Ok(model)
    }
}

/// Binary AI/Human classifier.
///
/// Read-only once built: `predict*` take `&self` and can be shared across
/// threads, while [`Classifier::fit`] produces a new instance.
#[derive(Debug, Clone)]
pub struct Classifier {
    model: LogisticModel,
}

impl Classifier {
    pub fn new(model: LogisticModel) -> Result<Self, ModelError> {
        model.validate()?;
        Ok(Self { model })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        Ok(Self {
            model: LogisticModel::load(path)?,
        })
    }

    /// Fit on a feature matrix with one row per example and columns in
    /// [`FEATURE_NAMES`] order.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[Classification],
        params: &FitParams,
    ) -> Result<Self, FitError> {
        let (weights, bias) = fit::fit(x, y, params, FEATURE_COUNT)?;
        Ok(Self {
            model: LogisticModel {
                weights,
                bias,
                ..LogisticModel::new([0.0; FEATURE_COUNT], 0.0)
            },
        })
    }

    pub fn fit_features(
        features: &[FeatureVector],
        y: &[Classification],
        params: &FitParams,
    ) -> Result<Self, FitError> {
        Self::fit(feature_matrix(features).view(), y, params)
    }

    #[must_use]
    pub fn model(&self) -> &LogisticModel {
        &self.model
    }

    #[must_use]
    pub fn into_model(self) -> LogisticModel {
        self.model
    }

    fn check_input(&self, values: &[f64]) -> Result<(), ModelError> {
        if values.len() != self.model.weights.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.model.weights.len(),
                got: values.len(),
            });
        }
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ModelError::NonFiniteFeature { index, value });
        }
        Ok(())
    }

    fn score(&self, values: &[f64]) -> f64 {
        dot(&self.model.weights, values) + self.model.bias
    }

    /// Linear score `w·x + b`.
    ///
    /// Fails on a slice whose length differs from the weight vector or that
    /// holds non-finite values; nothing is truncated or padded.
    pub fn decision_function(&self, values: &[f64]) -> Result<f64, ModelError> {
        self.check_input(values)?;
        Ok(self.score(values))
    }

    /// `P(Human)` and `P(AI) = σ(w·x + b)`.
    pub fn predict_proba(&self, values: &[f64]) -> Result<Prediction, ModelError> {
        self.decision_function(values)
            .map(|z| Prediction::from_ai_probability(sigmoid(z)))
    }

    /// AI if `P(AI) >= 0.5`.
    pub fn predict(&self, values: &[f64]) -> Result<Classification, ModelError> {
        self.predict_proba(values)
            .map(|prediction| prediction.classification(CLASSIFICATION_THRESHOLD))
    }

    #[must_use]
    pub fn predict_proba_features(&self, features: &FeatureVector) -> Prediction {
        Prediction::from_ai_probability(sigmoid(self.score(&features.to_array())))
    }

    #[must_use]
    pub fn predict_features(&self, features: &FeatureVector) -> Classification {
        self.predict_proba_features(features)
            .classification(CLASSIFICATION_THRESHOLD)
    }

    /// Per-feature contributions `wᵢ·xᵢ`, largest magnitude first.
    #[must_use]
    pub fn explain(&self, features: &FeatureVector) -> Vec<(&'static str, f64)> {
        let mut contributions = features
            .iter_named()
            .zip(&self.model.weights)
            .map(|((name, value), weight)| (name, weight * value))
            .collect::<Vec<_>>();
        contributions.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        contributions
    }
}

/// Stack feature vectors into an `n × FEATURE_COUNT` matrix.
#[must_use]
pub fn feature_matrix(features: &[FeatureVector]) -> Array2<f64> {
    let mut matrix = Array2::zeros((features.len(), FEATURE_COUNT));
    for (mut row, vector) in matrix.outer_iter_mut().zip(features) {
        row.assign(&ndarray::aview1(&vector.to_array()));
    }
    matrix
}
