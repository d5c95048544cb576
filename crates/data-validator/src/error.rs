//! Validation Error Types

use thiserror::Error;

/// Errors raised while validating and preprocessing a listing record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Required fields absent from the record
    #[error("Missing required field: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Fields holding values that cannot be read as finite numbers, as
    /// `(field, raw value)` pairs
    #[error("Fields must be numeric: {}", describe_values(.0))]
    NonNumeric(Vec<(String, String)>),

    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Building without floors, floor ratio is undefined
    #[error("total_floors must be non-zero to derive floor_ratio")]
    ZeroTotalFloors,

    /// Features still null after preprocessing
    #[error("The following columns contain null values after preprocessing: {}", .0.join(", "))]
    NullFeatures(Vec<String>),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

fn describe_values(values: &[(String, String)]) -> String {
    values
        .iter()
        .map(|(field, value)| format!("{} = {}", field, value))
        .collect::<Vec<_>>()
        .join(", ")
}
