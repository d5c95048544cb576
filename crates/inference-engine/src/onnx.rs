//! ONNX Models via tract

use crate::model::PriceModel;
use crate::InferenceError;
use feature_engine::FeatureVector;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;
use tracing::{debug, info};

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Regressor exported to ONNX, e.g. from scikit-learn or XGBoost.
///
/// The graph takes one `[1, n]` float input in feature-vector order and
/// produces the raw price as the first element of its first output.
pub struct OnnxModel {
    /// Artifact path
    path: PathBuf,
    /// Optimized execution plan
    plan: OnnxPlan,
}

impl OnnxModel {
    /// Load and optimize an ONNX artifact
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        info!("Loading ONNX model from {}", path.display());

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            path: path.to_path_buf(),
            plan,
        })
    }

    /// Get model path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, features: &FeatureVector) -> TractResult<f64> {
        let values: Vec<f32> = features.values().iter().map(|&v| v as f32).collect();
        let shape = (1, values.len());
        let input: Tensor = tract_ndarray::Array2::from_shape_vec(shape, values)?.into();

        let outputs = self.plan.run(tvec!(input.into()))?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("model produced no outputs"))?;
        let output = output.cast_to::<f64>()?;
        output
            .as_slice::<f64>()?
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("model produced an empty output tensor"))
    }
}

impl PriceModel for OnnxModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        let prediction = self.run(features).map_err(|e| InferenceError::PredictionFailed {
            model: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!("ONNX prediction from {}: {}", self.path.display(), prediction);
        Ok(prediction)
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_is_load_error() {
        let result = OnnxModel::load(Path::new("does/not/exist_model.onnx"));
        assert!(matches!(result, Err(InferenceError::ModelLoadError(_))));
    }
}
