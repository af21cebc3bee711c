//! Franchise store location record

use serde::{Deserialize, Serialize};

use crate::geo::{is_in_circle, Coordinate};
use crate::util::time::local_timestamp;

/// Service radius used when none is given
pub const DEFAULT_RADIUS_KM: f64 = 3.0;

/// A franchise store with its service circle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreLocation {
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Service radius in kilometers
    pub radius: f64,
    #[serde(default)]
    pub circle_center_lat: Option<f64>,
    #[serde(default)]
    pub circle_center_lng: Option<f64>,
    pub timestamp: String,
}

/// Status of a store relative to its own service circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CircleStatus {
    /// Distance between the store and the circle center
    pub offset_km: f64,
    pub in_circle: bool,
}

impl StoreLocation {
    /// Create a location stamped with the current local time
    pub fn new(name: impl Into<String>, address: impl Into<String>, at: Coordinate, radius: f64) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            latitude: at.latitude,
            longitude: at.longitude,
            radius,
            circle_center_lat: None,
            circle_center_lng: None,
            timestamp: local_timestamp(),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Circle center, falling back to the store itself when unset
    pub fn circle_center(&self) -> Coordinate {
        match (self.circle_center_lat, self.circle_center_lng) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
            _ => self.coordinate(),
        }
    }

    /// Whether the circle center was moved away from the store
    pub fn has_custom_center(&self) -> bool {
        self.circle_center_lat.is_some() && self.circle_center_lng.is_some()
    }

    pub fn set_circle_center(&mut self, center: Coordinate) {
        self.circle_center_lat = Some(center.latitude);
        self.circle_center_lng = Some(center.longitude);
    }

    pub fn reset_circle_center(&mut self) {
        self.circle_center_lat = None;
        self.circle_center_lng = None;
    }

    /// Distance in km between the store and its circle center
    pub fn center_offset_km(&self) -> f64 {
        self.coordinate().distance_to(&self.circle_center())
    }

    /// Whether the store still sits inside its own service circle
    pub fn is_in_own_circle(&self) -> bool {
        is_in_circle(&self.coordinate(), &self.circle_center(), self.radius)
    }

    pub fn circle_status(&self) -> CircleStatus {
        CircleStatus {
            offset_km: self.center_offset_km(),
            in_circle: self.is_in_own_circle(),
        }
    }

    /// Whether `point` falls inside this store's service circle
    pub fn covers(&self, point: &Coordinate) -> bool {
        is_in_circle(point, &self.circle_center(), self.radius)
    }

    /// Check the record invariants
    pub fn validate(&self) -> Result<(), LocationError> {
        if self.name.trim().is_empty() {
            return Err(LocationError::EmptyName);
        }
        if !self.coordinate().is_valid() {
            return Err(LocationError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(LocationError::InvalidRadius(self.radius));
        }
        if let (Some(lat), Some(lng)) = (self.circle_center_lat, self.circle_center_lng) {
            if !Coordinate::new(lat, lng).is_valid() {
                return Err(LocationError::InvalidCoordinate {
                    latitude: lat,
                    longitude: lng,
                });
            }
        }
        Ok(())
    }
}

/// Location validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Store name must not be empty")]
    EmptyName,

    #[error("Invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Radius must be a positive number of kilometers, got {0}")]
    InvalidRadius(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StoreLocation {
        StoreLocation::new("Ampang", "Jalan Ampang", Coordinate::new(3.1590, 101.7130), 3.0)
    }

    #[test]
    fn test_center_defaults_to_store() {
        let s = store();
        assert_eq!(s.circle_center(), s.coordinate());
        assert_eq!(s.center_offset_km(), 0.0);
        assert!(s.is_in_own_circle());
    }

    #[test]
    fn test_half_set_center_falls_back() {
        let mut s = store();
        s.circle_center_lat = Some(10.0);
        assert!(!s.has_custom_center());
        assert_eq!(s.circle_center(), s.coordinate());
    }

    #[test]
    fn test_moved_center_outside_radius() {
        let mut s = store();
        s.set_circle_center(Coordinate::new(3.3, 101.7130));
        assert!(s.has_custom_center());
        assert!(s.center_offset_km() > 15.0);
        assert!(!s.is_in_own_circle());

        s.reset_circle_center();
        assert!(s.is_in_own_circle());
    }

    #[test]
    fn test_validate() {
        assert_eq!(store().validate(), Ok(()));

        let mut s = store();
        s.name = "  ".to_string();
        assert_eq!(s.validate(), Err(LocationError::EmptyName));

        let mut s = store();
        s.radius = 0.0;
        assert_eq!(s.validate(), Err(LocationError::InvalidRadius(0.0)));

        let mut s = store();
        s.latitude = 91.0;
        assert!(matches!(s.validate(), Err(LocationError::InvalidCoordinate { .. })));
    }

    #[test]
    fn test_json_uses_camel_case() {
        let mut s = store();
        s.set_circle_center(Coordinate::new(3.2, 101.8));
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["circleCenterLat"], 3.2);
        assert_eq!(json["circleCenterLng"], 101.8);
        assert_eq!(json["radius"], 3.0);
    }
}
