//! Feature Engineering Engine
//!
//! Turns raw apartment listings into model-ready feature vectors, including
//! the floor ratio and the geographic area appeal score.

mod appeal;
mod features;
mod geodesic;

pub use appeal::{AreaAppealScorer, ReferencePoint, ReferencePointSet};
pub use features::{
    floor_ratio, FeatureEngineer, FeatureVector, AREA_APPEAL, EXCLUDED_FIELDS, FLOOR_RATIO,
    IDENTIFIER_FIELDS, REQUIRED_FIELDS,
};
pub use geodesic::{distance_km, Coordinate};
