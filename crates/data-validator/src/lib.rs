//! Listing Record Validation
//!
//! Provides presence-checked record access, numeric coercion and range
//! checking for apartment listing payloads.

mod error;
mod record;
mod validator;

pub use error::ValidationError;
pub use record::{Field, RawRecord};
pub use validator::{ValidationConfig, Validator, NULL_SENTINEL};
