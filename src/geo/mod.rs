//! Geodesic math for store service circles

pub mod distance;
pub mod projection;

pub use distance::{distance, is_in_circle, Coordinate, EARTH_RADIUS_KM};
pub use projection::{interpolated_circle_radius, pixel_radius};
