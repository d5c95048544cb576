//! Price Model Interface and Linear Model

use crate::InferenceError;
use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// A pre-trained regressor.
///
/// Predictions are raw prices in millions of currency units. Models are
/// shared across requests and never mutated after loading.
pub trait PriceModel: Send + Sync {
    /// Predict the raw price for one feature vector
    fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError>;

    /// Short identifier of the artifact format
    fn kind(&self) -> &'static str;
}

/// Linear regression with named coefficients, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Intercept term
    pub intercept: f64,
    /// Weight per feature name
    pub coefficients: BTreeMap<String, f64>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: BTreeMap<String, f64>) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }

    /// Load a model from a JSON artifact
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;
        let model: Self = serde_json::from_str(&raw)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;
        debug!(
            "Parsed linear model with {} coefficients from {}",
            model.coefficients.len(),
            path.display()
        );
        Ok(model)
    }
}

impl PriceModel for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        let mut total = self.intercept;
        for (name, weight) in &self.coefficients {
            let value = features.get(name).ok_or_else(|| InferenceError::InvalidInputShape {
                expected: format!("feature {}", name),
                actual: features.names().join(", "),
            })?;
            total += weight * value;
        }
        Ok(total)
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}
