//! Great-circle distance and circle containment

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the valid degree range
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Distance to another coordinate in kilometers
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Haversine distance between two points, in kilometers
pub fn distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// True when `point` lies within `radius_km` of `center`, boundary included
pub fn is_in_circle(point: &Coordinate, center: &Coordinate, radius_km: f64) -> bool {
    point.distance_to(center) <= radius_km
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUALA_LUMPUR: Coordinate = Coordinate {
        latitude: 3.1390,
        longitude: 101.6869,
    };
    const SINGAPORE: Coordinate = Coordinate {
        latitude: 1.3521,
        longitude: 103.8198,
    };

    #[test]
    fn test_distance_to_self_is_zero() {
        for p in [KUALA_LUMPUR, SINGAPORE, Coordinate::new(-89.9, 179.9)] {
            assert_eq!(p.distance_to(&p), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let ab = KUALA_LUMPUR.distance_to(&SINGAPORE);
        let ba = SINGAPORE.distance_to(&KUALA_LUMPUR);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_distance_kuala_lumpur_singapore() {
        // Roughly 308 km as the crow flies
        let d = KUALA_LUMPUR.distance_to(&SINGAPORE);
        assert!(d > 300.0 && d < 320.0, "got {d}");
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        let d = distance(0.0, 0.0, 0.0, 1.0);
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-9);
    }

    #[test]
    fn test_antipodal_points() {
        let d = distance(0.0, 0.0, 0.0, 180.0);
        assert!((d - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_in_circle_boundary_inclusive() {
        let center = Coordinate::new(0.0, 0.0);
        let point = Coordinate::new(0.0, 0.5);
        let exact = point.distance_to(&center);

        assert!(is_in_circle(&point, &center, exact));
        assert!(!is_in_circle(&point, &center, exact - 1e-6));
    }

    #[test]
    fn test_in_circle_nearby_and_far() {
        let nearby = Coordinate::new(3.14, 101.69);
        assert!(is_in_circle(&nearby, &KUALA_LUMPUR, 3.0));
        assert!(!is_in_circle(&SINGAPORE, &KUALA_LUMPUR, 50.0));
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(KUALA_LUMPUR.is_valid());
        assert!(Coordinate::new(90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }
}
