//! Location records, the ordered location list, and its CSV persistence

pub mod book;
pub mod csv_store;
pub mod location;

pub use book::{BookError, Coverage, LocationBook};
pub use csv_store::{CsvLocationStore, StoreError};
pub use location::{CircleStatus, LocationError, StoreLocation, DEFAULT_RADIUS_KM};
