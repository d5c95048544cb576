//! Data Validator for Numeric Coercion and Range Checking

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// String spelling of a missing value accepted in listing payloads
pub const NULL_SENTINEL: &str = "null";

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Latitude valid range (degrees)
    pub lat_range: (f64, f64),
    /// Longitude valid range (degrees)
    pub lon_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            lat_range: (-90.0, 90.0),
            lon_range: (-180.0, 180.0),
        }
    }
}

/// Validator for listing record values
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        // NaN fails both comparisons, so test for containment instead
        if value >= range.0 && value <= range.1 {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        }
    }

    /// Validate latitude
    pub fn validate_latitude(&self, lat: f64) -> Result<(), ValidationError> {
        self.validate_range("lat", lat, self.config.lat_range)
    }

    /// Validate longitude
    pub fn validate_longitude(&self, lon: f64) -> Result<(), ValidationError> {
        self.validate_range("lon", lon, self.config.lon_range)
    }

    /// Coerce a raw JSON value into a feature value.
    ///
    /// `null` and the `"null"` sentinel become `None`. Numbers pass through,
    /// booleans map to 0/1 and numeric strings are parsed. Anything else,
    /// including strings spelling an infinity, is rejected with the
    /// offending field named.
    pub fn coerce_numeric(
        &self,
        field: &str,
        value: &Value,
    ) -> Result<Option<f64>, ValidationError> {
        match value {
            Value::Null => Ok(None),
            Value::Number(number) => number
                .as_f64()
                .map(Some)
                .ok_or_else(|| non_numeric(field, value)),
            Value::Bool(flag) => Ok(Some(if *flag { 1.0 } else { 0.0 })),
            Value::String(text) => {
                let text = text.trim();
                if text.eq_ignore_ascii_case(NULL_SENTINEL) {
                    return Ok(None);
                }
                text.parse::<f64>()
                    .ok()
                    .filter(|number| number.is_finite())
                    .map(Some)
                    .ok_or_else(|| non_numeric(field, value))
            }
            Value::Array(_) | Value::Object(_) => Err(non_numeric(field, value)),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

fn non_numeric(field: &str, value: &Value) -> ValidationError {
    ValidationError::NonNumeric(vec![(field.to_string(), value.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_valid_coordinates() {
        let validator = Validator::default();
        assert!(validator.validate_latitude(43.22).is_ok());
        assert!(validator.validate_latitude(-90.0).is_ok());
        assert!(validator.validate_longitude(180.0).is_ok());
    }

    #[test]
    fn test_invalid_coordinates() {
        let validator = Validator::default();
        assert!(validator.validate_latitude(91.0).is_err());
        assert!(validator.validate_longitude(-180.5).is_err());
        assert!(validator.validate_latitude(f64::NAN).is_err());
    }

    #[test]
    fn test_coerce_values() {
        let validator = Validator::default();
        assert_eq!(validator.coerce_numeric("rooms", &json!(3)).unwrap(), Some(3.0));
        assert_eq!(validator.coerce_numeric("area", &json!("54.5")).unwrap(), Some(54.5));
        assert_eq!(validator.coerce_numeric("is_new", &json!(true)).unwrap(), Some(1.0));
        assert_eq!(validator.coerce_numeric("area", &json!(null)).unwrap(), None);
        assert_eq!(validator.coerce_numeric("area", &json!("NULL")).unwrap(), None);
    }

    #[test]
    fn test_coerce_rejects_text() {
        let validator = Validator::default();
        let err = validator.coerce_numeric("rooms", &json!("three")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NonNumeric(vec![("rooms".into(), "\"three\"".into())])
        );
        assert!(validator.coerce_numeric("rooms", &json!([3])).is_err());
    }

    #[test]
    fn test_coerce_rejects_infinite_strings() {
        let validator = Validator::default();
        for text in ["inf", "infinity", "-Infinity", "1e400", "NaN"] {
            let err = validator.coerce_numeric("area", &json!(text)).unwrap_err();
            assert!(
                matches!(err, ValidationError::NonNumeric(ref fields) if fields[0].0 == "area"),
                "{}",
                text
            );
        }
    }

    proptest! {
        #[test]
        fn prop_numeric_strings_round_trip(value in -1.0e9f64..1.0e9) {
            let validator = Validator::default();
            let coerced = validator.coerce_numeric("area", &json!(value.to_string())).unwrap();
            prop_assert_eq!(coerced, Some(value));
        }
    }
}
