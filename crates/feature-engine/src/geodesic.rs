//! Geodesic Distance on the WGS-84 Ellipsoid

use geographiclib_rs::{Geodesic, InverseGeodesic};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

fn wgs84() -> &'static Geodesic {
    static WGS84: OnceLock<Geodesic> = OnceLock::new();
    WGS84.get_or_init(Geodesic::wgs84)
}

/// Geodesic distance in kilometers between two coordinates.
///
/// Solves the inverse problem with Karney's algorithm, which converges for
/// every pair of points including nearly antipodal ones.
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let meters: f64 = wgs84().inverse(from.lat, from.lon, to.lat, to.lon);
    meters / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flinders_peak_to_buninyong() {
        // Reference geodesic: 54972.271 m
        let flinders = Coordinate::new(-37.950_103_4, 144.424_867_9);
        let buninyong = Coordinate::new(-37.652_821_1, 143.926_495_5);
        let distance = distance_km(flinders, buninyong);
        assert!((distance - 54.972_271).abs() < 1e-4, "got {}", distance);
    }

    #[test]
    fn test_one_degree_latitude_at_equator() {
        let distance = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((distance - 110.574).abs() < 0.01, "got {}", distance);
    }

    #[test]
    fn test_coincident_points() {
        let point = Coordinate::new(43.2220, 76.8512);
        assert!(distance_km(point, point).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinate::new(43.2220, 76.8512);
        let b = Coordinate::new(43.3521, 77.0405);
        assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_nearly_antipodal() {
        let distance = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.5, 179.7));
        assert!(distance.is_finite());
        assert!(distance > 19_000.0 && distance < 20_100.0, "got {}", distance);
    }

    #[test]
    fn test_exact_antipodes_on_meridian() {
        // Half the meridian: 20003.931 km
        let distance = distance_km(Coordinate::new(90.0, 0.0), Coordinate::new(-90.0, 0.0));
        assert!((distance - 20_003.931).abs() < 0.01, "got {}", distance);
    }
}
