/// Classification threshold between 0.0 and 1.0.
///
/// If P(AI) >= threshold, the text is classified as AI-generated.
/// The model is not calibrated, so this stays at the logistic midpoint.
pub const CLASSIFICATION_THRESHOLD: f64 = 0.5;
