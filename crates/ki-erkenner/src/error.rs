use std::path::PathBuf;

/// Errors raised when loading, validating or scoring with a model.
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("Dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Feature order mismatch: model was trained on {found:?}")]
    FeatureOrderMismatch { found: Vec<String> },

    #[error("Non-finite feature value at index {index}: {value}")]
    NonFiniteFeature { index: usize, value: f64 },

    #[error("Non-finite weight at index {index}: {value}")]
    NonFiniteWeight { index: usize, value: f64 },

    #[error("Non-finite bias: {0}")]
    NonFiniteBias(f64),

    #[error("Invalid model JSON")]
    Json(#[from] serde_json::Error),

    #[error("Failed to access model file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the logistic regression solver.
#[derive(thiserror::Error, Debug)]
pub enum FitError {
    #[error("Cannot fit: the dataset is empty")]
    EmptyDataset,

    #[error("Cannot fit: insufficient class diversity, only {0} examples present")]
    InsufficientClassDiversity(crate::Classification),

    #[error("Cannot fit: {rows} feature rows but {labels} labels")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("Cannot fit: expected {expected} feature columns, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Cannot fit: non-finite feature value at row {row}, column {column}")]
    NonFiniteFeature { row: usize, column: usize },

    #[error("Invalid regularization strength C={0}, must be positive and finite")]
    InvalidRegularization(f64),

    #[error("Newton system became singular at iteration {iteration}")]
    SingularSystem { iteration: usize },
}

/// Errors raised while preparing a training corpus or running training.
#[derive(thiserror::Error, Debug)]
pub enum TrainingError {
    #[error("Unknown label {0:?}, expected \"KI\" or \"Mensch\"")]
    UnknownLabel(String),

    #[error("Invalid test size {0}, must lie strictly between 0 and 1")]
    InvalidTestSize(f64),

    #[error("Failed to read corpus file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid corpus record on line {line}")]
    InvalidRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Fit(#[from] FitError),
}
