//! Model Registry
//!
//! Name to model mapping, built once at startup and read-only afterwards.
//! Names come from artifact file stems with a trailing `_model` removed, so
//! `linear_regression_model.onnx` registers as `linear_regression`.

use crate::model::{LinearModel, PriceModel};
use crate::onnx::OnnxModel;
use crate::InferenceError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Model used when a request does not name one
pub const DEFAULT_MODEL: &str = "linear_regression";

const MODEL_SUFFIX: &str = "_model";

/// Read-only set of loaded models, ordered by name
#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, Arc<dyn PriceModel>>,
}

impl ModelRegistry {
    /// Start building a registry by hand
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// Load every model artifact found directly inside `dir`.
    ///
    /// `.json` files are linear models and `.onnx` files run through tract.
    /// Other files are ignored. An artifact that fails to load is logged and
    /// skipped so the remaining models keep serving.
    pub fn load_dir(dir: &Path) -> Result<Self, InferenceError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut builder = Self::builder();
        for path in paths {
            let Some(name) = model_name(&path) else {
                continue;
            };
            let loaded: Result<Arc<dyn PriceModel>, InferenceError> =
                match path.extension().and_then(|ext| ext.to_str()) {
                    Some("json") => {
                        LinearModel::load(&path).map(|m| Arc::new(m) as Arc<dyn PriceModel>)
                    }
                    Some("onnx") => {
                        OnnxModel::load(&path).map(|m| Arc::new(m) as Arc<dyn PriceModel>)
                    }
                    _ => continue,
                };

            match loaded {
                Ok(model) => {
                    info!("Loaded model: {} from {}", name, path.display());
                    builder = builder.with_shared(name, model);
                }
                Err(e) => warn!("Skipping model artifact {}: {}", path.display(), e),
            }
        }

        let registry = builder.build();
        info!("Model registry ready with {} model(s)", registry.len());
        Ok(registry)
    }

    /// Look up a model by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn PriceModel>> {
        self.models.get(name)
    }

    /// Whether a model is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Model names in registry order
    pub fn names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    /// Iterate `(name, model)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn PriceModel>)> {
        self.models.iter().map(|(name, model)| (name.as_str(), model))
    }

    /// Number of loaded models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.models.iter().map(|(name, model)| (name, model.kind())))
            .finish()
    }
}

/// Collects models before freezing them into a registry
#[derive(Default)]
pub struct ModelRegistryBuilder {
    models: BTreeMap<String, Arc<dyn PriceModel>>,
}

impl ModelRegistryBuilder {
    /// Register a model under `name`, replacing any previous entry
    pub fn with_model(self, name: impl Into<String>, model: impl PriceModel + 'static) -> Self {
        self.with_shared(name, Arc::new(model))
    }

    pub fn with_shared(mut self, name: impl Into<String>, model: Arc<dyn PriceModel>) -> Self {
        self.models.insert(name.into(), model);
        self
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry { models: self.models }
    }
}

/// Registry name for an artifact path
fn model_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let name = stem.strip_suffix(MODEL_SUFFIX).unwrap_or(stem);
    (!name.is_empty()).then(|| name.to_string())
}
