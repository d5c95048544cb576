//! Feature Vector Assembly

use crate::appeal::AreaAppealScorer;
use data_validator::{RawRecord, ValidationError, Validator};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Identifier and descriptive fields never used by a model
pub const IDENTIFIER_FIELDS: [&str; 9] = [
    "id",
    "title",
    "street",
    "house_num",
    "is_pledged",
    "was_former_hostel",
    "country",
    "city",
    "microdistrict",
];

/// Label and excluded-by-design fields
pub const EXCLUDED_FIELDS: [&str; 5] = [
    "price",
    "balcony",
    "bathroom",
    "furniture_status",
    "security",
];

/// Raw fields every record must carry
pub const REQUIRED_FIELDS: [&str; 4] = ["floor", "total_floors", "lat", "lon"];

pub const FLOOR_RATIO: &str = "floor_ratio";
pub const AREA_APPEAL: &str = "area_appeal";

/// Model-ready features in schema order.
///
/// Values are never missing or non-finite; every constructor checks this.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Build a vector from named values, rejecting NaN and infinite entries
    pub fn from_pairs<K, I>(pairs: I) -> Result<Self, ValidationError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        let mut draft = FeatureDraft::default();
        for (name, value) in pairs {
            draft.set(name.into(), Some(value));
        }
        draft.finish()
    }

    /// Feature names in schema order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Feature values, aligned with [`names`](Self::names)
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Look up one feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|idx| self.values.get(idx).copied())
    }

    /// Iterate `(name, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Feature columns while engineering is in progress; values may be missing
#[derive(Debug, Default)]
struct FeatureDraft {
    columns: Vec<(String, Option<f64>)>,
}

impl FeatureDraft {
    /// Replace in place if the column exists, otherwise append
    fn set(&mut self, name: String, value: Option<f64>) {
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(column) => column.1 = value,
            None => self.columns.push((name, value)),
        }
    }

    fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
    }

    fn take(&mut self, name: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|(n, _)| n == name)?;
        self.columns.remove(idx).1
    }

    /// Reject the draft if any column is missing or non-finite, naming all of them
    fn finish(self) -> Result<FeatureVector, ValidationError> {
        let nulls: Vec<String> = self
            .columns
            .iter()
            .filter(|(_, v)| v.map_or(true, |v| !v.is_finite()))
            .map(|(n, _)| n.clone())
            .collect();
        if !nulls.is_empty() {
            return Err(ValidationError::NullFeatures(nulls));
        }

        let (names, values) = self
            .columns
            .into_iter()
            .map(|(n, v)| (n, v.unwrap_or_default()))
            .unzip();
        Ok(FeatureVector { names, values })
    }
}

/// Floor position relative to the building's vertical midpoint.
///
/// 1.0 at the middle floor, decreasing toward ground and roof.
pub fn floor_ratio(floor: f64, total_floors: f64) -> Result<f64, ValidationError> {
    if total_floors == 0.0 {
        return Err(ValidationError::ZeroTotalFloors);
    }
    let middle_floor = total_floors / 2.0;
    Ok(1.0 - ((floor - middle_floor).abs() / middle_floor))
}

/// Turns raw listing records into feature vectors
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer {
    scorer: AreaAppealScorer,
    validator: Validator,
}

impl FeatureEngineer {
    /// Create an engineer from a scorer and a validator
    pub fn new(scorer: AreaAppealScorer, validator: Validator) -> Self {
        Self { scorer, validator }
    }

    /// Area appeal scorer in use
    pub fn scorer(&self) -> &AreaAppealScorer {
        &self.scorer
    }

    /// Engineer a feature vector from a raw record
    pub fn engineer(&self, record: &RawRecord) -> Result<FeatureVector, ValidationError> {
        let missing = record.missing(&REQUIRED_FIELDS);
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(
                missing.into_iter().map(String::from).collect(),
            ));
        }

        let mut record = record.clone();
        let dropped = record.drop_fields(&IDENTIFIER_FIELDS) + record.drop_fields(&EXCLUDED_FIELDS);

        let mut draft = FeatureDraft::default();
        let mut non_numeric = Vec::new();
        for (name, value) in record.iter() {
            match self.validator.coerce_numeric(name, value) {
                Ok(number) => draft.set(name.to_string(), number),
                Err(ValidationError::NonNumeric(fields)) => non_numeric.extend(fields),
                Err(e) => return Err(e),
            }
        }
        if !non_numeric.is_empty() {
            return Err(ValidationError::NonNumeric(non_numeric));
        }

        let floor = draft.take("floor");
        let ratio = match (floor, draft.get("total_floors")) {
            (Some(floor), Some(total_floors)) => Some(floor_ratio(floor, total_floors)?),
            _ => None,
        };
        draft.set(FLOOR_RATIO.to_string(), ratio);

        let lat = draft.take("lat");
        let lon = draft.take("lon");
        let appeal = match (lat, lon) {
            (Some(lat), Some(lon)) => {
                self.validator.validate_latitude(lat)?;
                self.validator.validate_longitude(lon)?;
                Some(self.scorer.score(lat, lon))
            }
            _ => None,
        };
        draft.set(AREA_APPEAL.to_string(), appeal);

        let features = draft.finish()?;
        debug!(
            "Engineered {} features ({} raw fields dropped)",
            features.len(),
            dropped
        );
        Ok(features)
    }

    /// Engineer directly from a parsed JSON body
    pub fn engineer_json(&self, body: Value) -> Result<FeatureVector, ValidationError> {
        self.engineer(&RawRecord::from_json(body)?)
    }
}
