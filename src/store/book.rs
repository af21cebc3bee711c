//! Ordered list of store locations addressed by position

use serde::Serialize;

use super::location::{CircleStatus, StoreLocation};
use crate::geo::Coordinate;

/// A store whose service circle covers some queried point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coverage {
    pub index: usize,
    pub name: String,
    pub distance_km: f64,
}

/// In-memory ordered location list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationBook {
    locations: Vec<StoreLocation>,
}

impl LocationBook {
    pub fn new(locations: Vec<StoreLocation>) -> Self {
        Self { locations }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StoreLocation> {
        self.locations.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoreLocation> {
        self.locations.iter()
    }

    pub fn into_inner(self) -> Vec<StoreLocation> {
        self.locations
    }

    /// Append a location, returning its index
    pub fn add(&mut self, location: StoreLocation) -> usize {
        self.locations.push(location);
        self.locations.len() - 1
    }

    /// Remove the location at `index`; later entries shift down
    pub fn delete(&mut self, index: usize) -> Result<StoreLocation, BookError> {
        self.check(index)?;
        Ok(self.locations.remove(index))
    }

    /// Move the service circle of the location at `index`
    pub fn update_circle_center(
        &mut self,
        index: usize,
        center: Coordinate,
    ) -> Result<CircleStatus, BookError> {
        if !center.is_valid() {
            return Err(BookError::InvalidCenter(center));
        }
        let location = self.get_mut(index)?;
        location.set_circle_center(center);
        Ok(location.circle_status())
    }

    /// Put the service circle back on the store
    pub fn reset_circle_center(&mut self, index: usize) -> Result<&StoreLocation, BookError> {
        let location = self.get_mut(index)?;
        location.reset_circle_center();
        Ok(location)
    }

    /// Stores whose service circle contains `point`, nearest circle first
    pub fn covering(&self, point: &Coordinate) -> Vec<Coverage> {
        let mut hits: Vec<Coverage> = self
            .locations
            .iter()
            .enumerate()
            .filter(|(_, location)| location.covers(point))
            .map(|(index, location)| Coverage {
                index,
                name: location.name.clone(),
                distance_km: location.circle_center().distance_to(point),
            })
            .collect();

        hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        hits
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut StoreLocation, BookError> {
        self.check(index)?;
        Ok(&mut self.locations[index])
    }

    fn check(&self, index: usize) -> Result<(), BookError> {
        if index < self.locations.len() {
            Ok(())
        } else {
            Err(BookError::OutOfRange {
                index,
                len: self.locations.len(),
            })
        }
    }
}

/// Location book errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookError {
    #[error("No location at index {index} (have {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("Invalid circle center ({}, {})", .0.latitude, .0.longitude)]
    InvalidCenter(Coordinate),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> LocationBook {
        let mut book = LocationBook::default();
        book.add(StoreLocation::new("KLCC", "", Coordinate::new(3.1579, 101.7116), 3.0));
        book.add(StoreLocation::new("Bangsar", "", Coordinate::new(3.1300, 101.6710), 4.0));
        book.add(StoreLocation::new("Penang", "", Coordinate::new(5.4141, 100.3288), 5.0));
        book
    }

    #[test]
    fn test_add_returns_index() {
        let mut b = book();
        let idx = b.add(StoreLocation::new("Ipoh", "", Coordinate::new(4.5975, 101.0901), 4.0));
        assert_eq!(idx, 3);
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn test_delete_shifts_order() {
        let mut b = book();
        let removed = b.delete(0).unwrap();
        assert_eq!(removed.name, "KLCC");
        assert_eq!(b.get(0).unwrap().name, "Bangsar");
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_delete_out_of_range() {
        let mut b = book();
        assert_eq!(b.delete(3), Err(BookError::OutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn test_update_and_reset_circle_center() {
        let mut b = book();
        let status = b
            .update_circle_center(1, Coordinate::new(3.2000, 101.6710))
            .unwrap();
        assert!(!status.in_circle);
        assert!(status.offset_km > 7.0);

        let reset = b.reset_circle_center(1).unwrap();
        assert!(!reset.has_custom_center());
        assert!(reset.is_in_own_circle());
    }

    #[test]
    fn test_update_rejects_invalid_center() {
        let mut b = book();
        let bad = Coordinate::new(120.0, 0.0);
        assert_eq!(b.update_circle_center(0, bad), Err(BookError::InvalidCenter(bad)));
        assert!(!b.get(0).unwrap().has_custom_center());
    }

    #[test]
    fn test_covering_nearest_first() {
        let b = book();
        // Between KLCC and Bangsar, inside both circles
        let point = Coordinate::new(3.1450, 101.6930);
        let hits = b.covering(&point);

        assert_eq!(hits.len(), 2);
        assert!(hits[0].distance_km <= hits[1].distance_km);
        assert!(hits.iter().all(|h| h.name != "Penang"));
    }

    #[test]
    fn test_covering_uses_moved_center() {
        let mut b = book();
        let far = Coordinate::new(3.5000, 101.7116);
        assert!(b.covering(&far).is_empty());

        b.update_circle_center(0, far).unwrap();
        let hits = b.covering(&far);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[0].distance_km, 0.0);
    }
}
