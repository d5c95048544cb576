//! Price Inference Engine
//!
//! Holds the read-only registry of pre-trained price models and combines
//! their predictions into a single price estimate.

mod ensemble;
mod model;
mod onnx;
mod registry;

pub use ensemble::{EnsemblePredictor, ModelSelector, Selection, ALL_MODELS, PRICE_SCALE};
pub use model::{LinearModel, PriceModel};
pub use onnx::OnnxModel;
pub use registry::{ModelRegistry, ModelRegistryBuilder, DEFAULT_MODEL};

use thiserror::Error;

/// Errors during model loading and inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    #[error("No models available for prediction")]
    NoModelsSelected,
    #[error("Model {model} failed: {reason}")]
    PredictionFailed { model: String, reason: String },
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
}

impl InferenceError {
    /// Caller errors: the selector did not resolve to any model
    pub fn is_not_found(&self) -> bool {
        matches!(self, InferenceError::ModelNotFound(_) | InferenceError::NoModelsSelected)
    }
}
