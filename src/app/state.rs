//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::geocode::{GeocodeError, GeocodingClient};
use crate::store::{CsvLocationStore, StoreError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub locations: CsvLocationStore,
    pub geocoder: GeocodingClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, StateError> {
        let config = Arc::new(config);

        // Open (or create) the data file
        let locations = CsvLocationStore::open(config.data_file.clone())?;

        // Initialize geocoder
        let geocoder = GeocodingClient::new(&config)?;

        Ok(Self {
            config,
            locations,
            geocoder,
        })
    }
}

/// Startup errors
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to open location store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to build geocoder: {0}")]
    Geocoder(#[from] GeocodeError),
}
