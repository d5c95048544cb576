//! Area Appeal Scoring
//!
//! Weighted proximity of a listing to a fixed set of named landmarks.
//! Each landmark contributes `weight / (distance_km + 1)`, so a listing on
//! top of a landmark gets at most its full weight. Weights need not sum to
//! one; the score is an unnormalized desirability measure.

use crate::geodesic::{distance_km, Coordinate};
use data_validator::ValidationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Named landmark with its desirability weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// Landmark identifier
    pub name: String,
    /// Landmark location
    pub coords: Coordinate,
    /// Positive contribution at zero distance
    pub weight: f64,
}

impl ReferencePoint {
    /// Create a reference point from decimal degrees
    pub fn new(name: impl Into<String>, lat: f64, lon: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            coords: Coordinate::new(lat, lon),
            weight,
        }
    }
}

/// Almaty landmarks: (name, lat, lon, weight)
const ALMATY_LANDMARKS: [(&str, f64, f64, f64); 22] = [
    ("city_center", 43.2220, 76.8512, 0.3),
    ("airport", 43.3521, 77.0405, 0.15),
    ("presidents_park", 43.1983, 76.8800, 0.1),
    ("dostyk_plaza", 43.2380, 76.9582, 0.15),
    ("kok_tobe", 43.2312, 76.9597, 0.1),
    ("mega_park_mall", 43.2622, 76.9264, 0.1),
    ("shymbulak_ski_resort", 43.1590, 77.0815, 0.05),
    ("almaty_tower", 43.2389, 76.9124, 0.1),
    ("esentai_mall", 43.2236, 76.9266, 0.1),
    ("central_park", 43.2545, 76.9515, 0.05),
    ("raiymbek_batyr", 43.2709, 76.9422, 0.1),
    ("zhibek_zholy", 43.2582, 76.9465, 0.1),
    ("almaly", 43.2522, 76.9476, 0.1),
    ("abay", 43.2451, 76.9479, 0.1),
    ("baikonur", 43.2332, 76.9496, 0.1),
    ("auezov_theater", 43.2277, 76.9501, 0.1),
    ("alatau", 43.2178, 76.9439, 0.1),
    ("sairan", 43.2106, 76.9247, 0.1),
    ("moscow", 43.2074, 76.9038, 0.1),
    ("sayahat", 43.2561, 76.9101, 0.1),
    ("railway_station_1", 43.2567, 76.9278, 0.05),
    ("railway_station_2", 43.2615, 76.9214, 0.05),
];

/// Immutable set of reference points, built once and shared
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferencePointSet {
    points: Vec<ReferencePoint>,
}

impl ReferencePointSet {
    /// Build a custom set. Weights must be positive and finite, coordinates in range.
    pub fn new(points: Vec<ReferencePoint>) -> Result<Self, ValidationError> {
        for point in &points {
            if !(point.weight.is_finite() && point.weight > 0.0) {
                return Err(ValidationError::InvalidFormat(format!(
                    "reference point {} has non-positive weight {}",
                    point.name, point.weight
                )));
            }
            if !(-90.0..=90.0).contains(&point.coords.lat)
                || !(-180.0..=180.0).contains(&point.coords.lon)
            {
                return Err(ValidationError::InvalidFormat(format!(
                    "reference point {} has invalid coordinates ({}, {})",
                    point.name, point.coords.lat, point.coords.lon
                )));
            }
        }
        Ok(Self { points })
    }

    /// The built-in Almaty landmark table
    pub fn almaty() -> Self {
        Self {
            points: ALMATY_LANDMARKS
                .iter()
                .map(|&(name, lat, lon, weight)| ReferencePoint::new(name, lat, lon, weight))
                .collect(),
        }
    }

    pub fn points(&self) -> &[ReferencePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of all weights, the supremum of any appeal score
    pub fn total_weight(&self) -> f64 {
        self.points.iter().map(|p| p.weight).sum()
    }
}

impl Default for ReferencePointSet {
    fn default() -> Self {
        Self::almaty()
    }
}

/// Scores coordinates against a shared reference point set
#[derive(Debug, Clone)]
pub struct AreaAppealScorer {
    points: Arc<ReferencePointSet>,
}

impl AreaAppealScorer {
    pub fn new(points: Arc<ReferencePointSet>) -> Self {
        Self { points }
    }

    pub fn reference_points(&self) -> &ReferencePointSet {
        &self.points
    }

    /// Area appeal of a location
    pub fn score(&self, lat: f64, lon: f64) -> f64 {
        let location = Coordinate::new(lat, lon);
        self.points
            .points()
            .iter()
            .map(|point| point.weight * (1.0 / (distance_km(location, point.coords) + 1.0)))
            .sum()
    }
}

impl Default for AreaAppealScorer {
    fn default() -> Self {
        Self::new(Arc::new(ReferencePointSet::default()))
    }
}
