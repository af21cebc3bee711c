//! Nominatim search API client

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::geo::Coordinate;
use crate::util::rate_limit::{create_limiter, Limiter};

/// Geocoding client for a Nominatim-compatible search endpoint
#[derive(Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
    limiter: Arc<Limiter>,
}

/// Raw search hit; Nominatim encodes coordinates as strings
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Resolved address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

impl GeocodeResult {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl GeocodingClient {
    pub fn new(config: &Config) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(config.geocoder_user_agent.clone())
            .timeout(config.geocoder_timeout)
            .build()
            .map_err(GeocodeError::Request)?;

        Ok(Self {
            client,
            base_url: config.geocoder_url.trim_end_matches('/').to_string(),
            limiter: create_limiter(config.geocoder_rate_per_sec),
        })
    }

    /// Resolve an address to the best matching coordinate
    pub async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }

        self.limiter.until_ready().await;

        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(GeocodeError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Api { status: status.as_u16(), body });
        }

        let hits: Vec<SearchHit> = response.json().await.map_err(GeocodeError::Parse)?;
        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))?;

        let latitude = hit
            .lat
            .parse::<f64>()
            .map_err(|_| GeocodeError::BadCoordinate(hit.lat.clone()))?;
        let longitude = hit
            .lon
            .parse::<f64>()
            .map_err(|_| GeocodeError::BadCoordinate(hit.lon.clone()))?;

        let result = GeocodeResult {
            latitude,
            longitude,
            display_name: hit.display_name,
        };

        // NaN, infinities and out-of-range degrees parse fine but are unusable
        if !result.coordinate().is_valid() {
            return Err(GeocodeError::BadCoordinate(format!("{}, {}", hit.lat, hit.lon)));
        }

        debug!(%address, latitude, longitude, "Geocoded address");
        Ok(result)
    }
}

/// Geocoding errors
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Address must not be empty")]
    EmptyAddress,

    #[error("Address not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Geocoder error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse geocoder response: {0}")]
    Parse(reqwest::Error),

    #[error("Geocoder returned an invalid coordinate: {0}")]
    BadCoordinate(String),
}
