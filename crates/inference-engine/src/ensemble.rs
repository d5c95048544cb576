//! Ensemble Prediction

use crate::model::PriceModel;
use crate::registry::ModelRegistry;
use crate::InferenceError;
use feature_engine::FeatureVector;
use std::sync::Arc;
use tracing::debug;

/// Selector value that runs every registered model
pub const ALL_MODELS: &str = "all";

/// Raw predictions are in millions of currency units
pub const PRICE_SCALE: f64 = 1_000_000.0;

/// Which models take part in a prediction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSelector {
    /// Every model in the registry
    All,
    /// Exactly one model by name
    Named(String),
}

impl ModelSelector {
    /// Parse a request's selector, falling back to `default` when absent
    pub fn parse(raw: Option<&str>, default: &str) -> Self {
        match raw {
            Some(ALL_MODELS) => ModelSelector::All,
            Some(name) => ModelSelector::Named(name.to_string()),
            None => ModelSelector::Named(default.to_string()),
        }
    }
}

/// Models resolved for one request
pub struct Selection<'r> {
    models: Vec<(&'r str, &'r Arc<dyn PriceModel>)>,
}

impl<'r> Selection<'r> {
    /// Names of the selected models, in registry order
    pub fn names(&self) -> Vec<&'r str> {
        self.models.iter().map(|(name, _)| *name).collect()
    }

    /// Number of selected models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Run every selected model and combine the results.
    ///
    /// The mean is rounded to two decimals in millions, then scaled to base
    /// currency units. The first failing model aborts the whole call.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        if self.models.is_empty() {
            return Err(InferenceError::NoModelsSelected);
        }

        let mut total = 0.0;
        for (name, model) in &self.models {
            let raw = model.predict(features).map_err(|e| match e {
                InferenceError::PredictionFailed { reason, .. } => {
                    InferenceError::PredictionFailed {
                        model: name.to_string(),
                        reason,
                    }
                }
                other => InferenceError::PredictionFailed {
                    model: name.to_string(),
                    reason: other.to_string(),
                },
            })?;
            if !raw.is_finite() {
                return Err(InferenceError::PredictionFailed {
                    model: name.to_string(),
                    reason: format!("non-finite prediction {}", raw),
                });
            }
            debug!("Model {} predicted {} (millions)", name, raw);
            total += raw;
        }

        let mean = total / self.models.len() as f64;
        Ok(round_to_cents(mean) * PRICE_SCALE)
    }
}

/// Resolves selectors against a registry and aggregates predictions
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsemblePredictor;

impl EnsemblePredictor {
    /// Create a new ensemble predictor
    pub fn new() -> Self {
        Self
    }

    /// Resolve a selector to the models it names
    pub fn select<'r>(
        &self,
        selector: &ModelSelector,
        registry: &'r ModelRegistry,
    ) -> Result<Selection<'r>, InferenceError> {
        let models: Vec<_> = match selector {
            ModelSelector::All => registry.iter().collect(),
            ModelSelector::Named(name) => {
                let (name, model) = registry
                    .iter()
                    .find(|(registered, _)| *registered == name.as_str())
                    .ok_or_else(|| InferenceError::ModelNotFound(name.clone()))?;
                vec![(name, model)]
            }
        };

        if models.is_empty() {
            return Err(InferenceError::NoModelsSelected);
        }
        Ok(Selection { models })
    }

    /// Predict a price in base currency units
    pub fn predict(
        &self,
        features: &FeatureVector,
        selector: &ModelSelector,
        registry: &ModelRegistry,
    ) -> Result<f64, InferenceError> {
        self.select(selector, registry)?.predict(features)
    }
}

/// Fractional digits that print any `f64` exactly
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Round to two decimals on the exact decimal value, ties to even.
///
/// Scaling by 100 first can land on a spurious `.5`, so the rounding is
/// done on the exact decimal expansion instead.
fn round_to_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), "00"));
    let (cents, rest) = fraction.as_bytes().split_at(2.min(fraction.len()));

    let mut digits: Vec<u8> = whole.bytes().chain(cents.iter().copied()).collect();
    let last_is_odd = digits.last().map_or(false, |d| (d - b'0') % 2 == 1);
    let round_up = match rest.split_first() {
        Some((b'6'..=b'9', _)) => true,
        Some((b'5', tail)) => tail.iter().any(|d| *d != b'0') || last_is_odd,
        _ => false,
    };

    if round_up {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    let split = digits.len() - cents.len();
    let sign = if value.is_sign_negative() { "-" } else { "" };
    let rounded = format!(
        "{}{}.{}",
        sign,
        String::from_utf8_lossy(&digits[..split]),
        String::from_utf8_lossy(&digits[split..])
    );
    rounded.parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinearModel;
    use std::collections::BTreeMap;

    struct Constant(f64);

    impl PriceModel for Constant {
        fn predict(&self, _features: &FeatureVector) -> Result<f64, InferenceError> {
            Ok(self.0)
        }

        fn kind(&self) -> &'static str {
            "constant"
        }
    }

    struct Broken;

    impl PriceModel for Broken {
        fn predict(&self, _features: &FeatureVector) -> Result<f64, InferenceError> {
            Err(InferenceError::InvalidInputShape {
                expected: "[1, 12]".into(),
                actual: "[1, 3]".into(),
            })
        }

        fn kind(&self) -> &'static str {
            "broken"
        }
    }

    fn features() -> FeatureVector {
        FeatureVector::from_pairs([
            ("total_floors", 10.0),
            ("floor_ratio", 1.0),
            ("area_appeal", 0.5),
        ])
        .unwrap()
    }

    fn registry() -> ModelRegistry {
        ModelRegistry::builder()
            .with_model("linear_regression", Constant(25.0))
            .with_model("random_forest", Constant(27.456))
            .build()
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!(ModelSelector::parse(Some("all"), "linear_regression"), ModelSelector::All);
        assert_eq!(
            ModelSelector::parse(Some("xgboost"), "linear_regression"),
            ModelSelector::Named("xgboost".into())
        );
        assert_eq!(
            ModelSelector::parse(None, "linear_regression"),
            ModelSelector::Named("linear_regression".into())
        );
    }

    #[test]
    fn test_all_averages_then_rounds_in_millions() {
        let price = EnsemblePredictor::new()
            .predict(&features(), &ModelSelector::All, &registry())
            .unwrap();
        // mean 26.228 -> 26.23 -> scaled
        assert_eq!(price, 26.23 * PRICE_SCALE);
    }

    #[test]
    fn test_single_model() {
        let selector = ModelSelector::Named("random_forest".into());
        let price = EnsemblePredictor::new()
            .predict(&features(), &selector, &registry())
            .unwrap();
        assert_eq!(price, 27.46 * PRICE_SCALE);
    }

    #[test]
    fn test_unknown_model() {
        let selector = ModelSelector::Named("zzz".into());
        let err = EnsemblePredictor::new()
            .predict(&features(), &selector, &registry())
            .unwrap_err();
        assert!(matches!(err, InferenceError::ModelNotFound(ref name) if name == "zzz"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_default_is_not_found() {
        let registry = ModelRegistry::builder().with_model("xgboost", Constant(1.0)).build();
        let selector = ModelSelector::parse(None, "linear_regression");
        let err = EnsemblePredictor::new()
            .predict(&features(), &selector, &registry)
            .unwrap_err();
        assert!(matches!(err, InferenceError::ModelNotFound(_)));
    }

    #[test]
    fn test_empty_registry_under_all() {
        let err = EnsemblePredictor::new()
            .predict(&features(), &ModelSelector::All, &ModelRegistry::default())
            .unwrap_err();
        assert!(matches!(err, InferenceError::NoModelsSelected));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_one_failing_model_aborts_ensemble() {
        let registry = ModelRegistry::builder()
            .with_model("linear_regression", Constant(25.0))
            .with_model("mlp", Broken)
            .build();
        let err = EnsemblePredictor::new()
            .predict(&features(), &ModelSelector::All, &registry)
            .unwrap_err();
        assert!(
            matches!(err, InferenceError::PredictionFailed { ref model, .. } if model == "mlp")
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_non_finite_prediction_fails() {
        let registry = ModelRegistry::builder()
            .with_model("linear_regression", Constant(f64::NAN))
            .build();
        let selector = ModelSelector::parse(None, "linear_regression");
        let err = EnsemblePredictor::new()
            .predict(&features(), &selector, &registry)
            .unwrap_err();
        assert!(matches!(err, InferenceError::PredictionFailed { .. }));
    }

    fn single(raw: f64) -> f64 {
        let registry = ModelRegistry::builder()
            .with_model("linear_regression", Constant(raw))
            .build();
        let selector = ModelSelector::parse(None, "linear_regression");
        EnsemblePredictor::new()
            .predict(&features(), &selector, &registry)
            .unwrap()
    }

    #[test]
    fn test_rounding_follows_exact_decimal_value() {
        // 73.255 is stored just below the tie, 73.255 * 100 rounds up to it
        assert_eq!(single(73.255), 73.25 * PRICE_SCALE);
        assert_eq!(single(1.115), 1.11 * PRICE_SCALE);
        assert_eq!(single(2.675), 2.67 * PRICE_SCALE);
        assert_eq!(single(0.135), 0.14 * PRICE_SCALE);
    }

    #[test]
    fn test_exact_ties_round_to_even() {
        assert_eq!(single(0.125), 0.12 * PRICE_SCALE);
        assert_eq!(single(0.375), 0.38 * PRICE_SCALE);
        assert_eq!(round_to_cents(-0.125), -0.12);
    }

    #[test]
    fn test_rounding_carries() {
        assert_eq!(round_to_cents(9.999), 10.0);
        assert_eq!(round_to_cents(-99.996), -100.0);
        assert_eq!(round_to_cents(26.228), 26.23);
        assert_eq!(round_to_cents(0.0), 0.0);
    }

    #[test]
    fn test_linear_models_in_ensemble() {
        let a = LinearModel::new(20.0, BTreeMap::from([("area_appeal".to_string(), 10.0)]));
        let b = LinearModel::new(10.0, BTreeMap::from([("total_floors".to_string(), 1.0)]));
        let registry = ModelRegistry::builder().with_model("a", a).with_model("b", b).build();
        let price = EnsemblePredictor::new()
            .predict(&features(), &ModelSelector::All, &registry)
            .unwrap();
        // (25 + 20) / 2
        assert_eq!(price, 22.5 * PRICE_SCALE);
    }
}
