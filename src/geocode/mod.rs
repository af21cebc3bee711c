//! Address geocoding

pub mod nominatim;

pub use nominatim::{GeocodeError, GeocodeResult, GeocodingClient};
