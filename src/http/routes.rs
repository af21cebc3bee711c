//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Deserializer, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::app::AppState;
use crate::geo::{interpolated_circle_radius, pixel_radius, Coordinate};
use crate::geocode::{GeocodeError, GeocodeResult};
use crate::store::{
    BookError, CircleStatus, Coverage, LocationBook, LocationError, StoreError, StoreLocation,
    DEFAULT_RADIUS_KM,
};
use crate::util::time::{local_timestamp, uptime_secs};

/// Zoom used by the circle endpoint when none is given
const DEFAULT_ZOOM: f64 = 10.0;
const MAX_ZOOM: f64 = 24.0;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .allowed_origins()
        .iter()
        .filter_map(|s| s.parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/geocode", get(geocode_handler))
        .route("/submit", post(submit_handler))
        .route("/data", get(data_handler))
        .route("/save", post(save_handler))
        .route("/coverage", get(coverage_handler))
        .route("/locations/:index", delete(delete_location_handler))
        .route(
            "/locations/:index/circle-center",
            put(move_circle_center_handler).delete(reset_circle_center_handler),
        )
        .route("/locations/:index/circle", get(circle_handler));

    Router::new()
        .nest("/api", api)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .with_state(state)
}

/// Run a store operation on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

/// A numeric request field as posted by a browser form
///
/// Forms post empty inputs as `""` and older data exports carry numbers as
/// strings. Unparsable input is kept so the handler can report which field
/// was wrong.
#[derive(Debug, Clone, Default, PartialEq)]
enum NumberField {
    #[default]
    Absent,
    Value(f64),
    Invalid(String),
}

impl<'de> Deserialize<'de> for NumberField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
            Other(serde_json::Value),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            None => NumberField::Absent,
            Some(Raw::Number(v)) => NumberField::Value(v),
            Some(Raw::Text(s)) if s.trim().is_empty() => NumberField::Absent,
            Some(Raw::Text(s)) => match s.trim().parse::<f64>() {
                Ok(v) => NumberField::Value(v),
                Err(_) => NumberField::Invalid(s),
            },
            Some(Raw::Other(v)) => NumberField::Invalid(v.to_string()),
        })
    }
}

impl NumberField {
    /// `None` when absent, an error naming `field` when unparsable
    fn resolve(&self, field: &str) -> Result<Option<f64>, String> {
        match self {
            NumberField::Absent => Ok(None),
            NumberField::Value(v) => Ok(Some(*v)),
            NumberField::Invalid(raw) => Err(format!("{} is not a number: {}", field, raw)),
        }
    }
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    uptime_secs: u64,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Franchise radius server is running",
        uptime_secs: uptime_secs(),
    })
}

// ============================================================================
// Geocoding endpoint
// ============================================================================

#[derive(Deserialize)]
struct GeocodeQuery {
    #[serde(default)]
    address: String,
}

async fn geocode_handler(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<GeocodeQuery>, AppError>,
) -> Result<Json<GeocodeResult>, AppError> {
    let result = state.geocoder.geocode(&query.address).await?;
    Ok(Json(result))
}

// ============================================================================
// Location list endpoints
// ============================================================================

#[derive(Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    latitude: NumberField,
    #[serde(default)]
    longitude: NumberField,
    #[serde(default)]
    radius: NumberField,
}

#[derive(Serialize)]
struct LocationResponse {
    message: &'static str,
    data: StoreLocation,
}

async fn submit_handler(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SubmitRequest>, AppError>,
) -> Result<Json<LocationResponse>, AppError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(LocationError::EmptyName.into());
    }

    let address = req.address.trim().to_string();

    let latitude = req.latitude.resolve("latitude").map_err(AppError::BadRequest)?;
    let longitude = req.longitude.resolve("longitude").map_err(AppError::BadRequest)?;
    let radius = req.radius.resolve("radius").map_err(AppError::BadRequest)?;

    // Coordinates the client already resolved take precedence over the address
    let coordinate = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude),
        _ if !address.is_empty() => state.geocoder.geocode(&address).await?.coordinate(),
        _ => {
            return Err(AppError::BadRequest(
                "Either an address or both latitude and longitude are required".to_string(),
            ))
        }
    };

    let location = StoreLocation::new(
        name,
        address,
        coordinate,
        radius.unwrap_or(DEFAULT_RADIUS_KM),
    );
    location.validate()?;

    let store = state.locations.clone();
    let location = blocking(move || store.append(&location).map(|_| location)).await?;

    info!(name = %location.name, lat = location.latitude, lng = location.longitude, "Location submitted");

    Ok(Json(LocationResponse {
        message: "Location saved",
        data: location,
    }))
}

#[derive(Serialize)]
struct DataResponse<T> {
    data: Vec<T>,
    count: usize,
}

impl<T> From<Vec<T>> for DataResponse<T> {
    fn from(data: Vec<T>) -> Self {
        let count = data.len();
        Self { data, count }
    }
}

async fn data_handler(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<StoreLocation>>, AppError> {
    let store = state.locations.clone();
    let locations = blocking(move || store.load_all()).await?;
    Ok(Json(locations.into()))
}

/// A location as posted back by the client for a full save
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    latitude: NumberField,
    #[serde(default)]
    longitude: NumberField,
    #[serde(default)]
    radius: NumberField,
    #[serde(default)]
    circle_center_lat: NumberField,
    #[serde(default)]
    circle_center_lng: NumberField,
    #[serde(default)]
    timestamp: Option<String>,
}

impl SaveEntry {
    fn into_location(self) -> Result<StoreLocation, String> {
        let latitude = self.latitude.resolve("latitude")?;
        let longitude = self.longitude.resolve("longitude")?;
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err("latitude and longitude are required".to_string());
        };

        let location = StoreLocation {
            name: self.name,
            address: self.address,
            latitude,
            longitude,
            radius: self.radius.resolve("radius")?.unwrap_or(DEFAULT_RADIUS_KM),
            circle_center_lat: self.circle_center_lat.resolve("circleCenterLat")?,
            circle_center_lng: self.circle_center_lng.resolve("circleCenterLng")?,
            timestamp: self
                .timestamp
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(local_timestamp),
        };

        location.validate().map_err(|e| e.to_string())?;
        Ok(location)
    }
}

#[derive(Deserialize)]
struct SaveRequest {
    #[serde(default)]
    data: Vec<SaveEntry>,
}

#[derive(Serialize)]
struct SaveResponse {
    message: &'static str,
    count: usize,
}

async fn save_handler(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SaveRequest>, AppError>,
) -> Result<Json<SaveResponse>, AppError> {
    let locations = req
        .data
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            entry
                .into_location()
                .map_err(|e| AppError::BadRequest(format!("Invalid location at index {}: {}", i, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let count = locations.len();
    let store = state.locations.clone();
    blocking(move || store.replace_all(&locations)).await?;

    info!(count, "Location list saved");

    Ok(Json(SaveResponse {
        message: "Locations saved",
        count,
    }))
}

async fn delete_location_handler(
    State(state): State<AppState>,
    WithRejection(Path(index), _): WithRejection<Path<usize>, AppError>,
) -> Result<Json<LocationResponse>, AppError> {
    let store = state.locations.clone();
    let removed = blocking(move || store.modify(|book| Ok(book.delete(index)?))).await?;

    info!(index, name = %removed.name, "Location deleted");

    Ok(Json(LocationResponse {
        message: "Location deleted",
        data: removed,
    }))
}

// ============================================================================
// Service circle endpoints
// ============================================================================

#[derive(Deserialize)]
struct CircleCenterRequest {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize)]
struct CircleCenterResponse {
    message: &'static str,
    data: StoreLocation,
    status: CircleStatus,
}

async fn move_circle_center_handler(
    State(state): State<AppState>,
    WithRejection(Path(index), _): WithRejection<Path<usize>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<CircleCenterRequest>, AppError>,
) -> Result<Json<CircleCenterResponse>, AppError> {
    let center = Coordinate::new(req.latitude, req.longitude);
    let store = state.locations.clone();

    let (location, status) = blocking(move || {
        store.modify(|book| {
            let status = book.update_circle_center(index, center)?;
            let location = book
                .get(index)
                .cloned()
                .ok_or(BookError::OutOfRange { index, len: book.len() })?;
            Ok((location, status))
        })
    })
    .await?;

    info!(
        index,
        offset_km = status.offset_km,
        in_circle = status.in_circle,
        "Circle center moved"
    );

    Ok(Json(CircleCenterResponse {
        message: "Circle center updated",
        data: location,
        status,
    }))
}

async fn reset_circle_center_handler(
    State(state): State<AppState>,
    WithRejection(Path(index), _): WithRejection<Path<usize>, AppError>,
) -> Result<Json<LocationResponse>, AppError> {
    let store = state.locations.clone();
    let location =
        blocking(move || store.modify(|book| Ok(book.reset_circle_center(index)?.clone()))).await?;

    Ok(Json(LocationResponse {
        message: "Circle center reset",
        data: location,
    }))
}

#[derive(Deserialize)]
struct CircleQuery {
    zoom: Option<f64>,
}

#[derive(Serialize)]
struct CircleResponse {
    center: Coordinate,
    radius_km: f64,
    offset_km: f64,
    in_circle: bool,
    zoom: f64,
    pixel_radius: f64,
    interpolated_radius: f64,
}

async fn circle_handler(
    State(state): State<AppState>,
    WithRejection(Path(index), _): WithRejection<Path<usize>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<CircleQuery>, AppError>,
) -> Result<Json<CircleResponse>, AppError> {
    let zoom = query.zoom.unwrap_or(DEFAULT_ZOOM);
    if !(0.0..=MAX_ZOOM).contains(&zoom) {
        return Err(AppError::BadRequest(format!(
            "Zoom must be between 0 and {}",
            MAX_ZOOM
        )));
    }

    let store = state.locations.clone();
    let locations = blocking(move || store.load_all()).await?;
    let book = LocationBook::new(locations);
    let location = book
        .get(index)
        .ok_or_else(|| AppError::NotFound(format!("No location at index {}", index)))?;

    let status = location.circle_status();

    Ok(Json(CircleResponse {
        center: location.circle_center(),
        radius_km: location.radius,
        offset_km: status.offset_km,
        in_circle: status.in_circle,
        zoom,
        pixel_radius: pixel_radius(location.radius, zoom),
        interpolated_radius: interpolated_circle_radius(location.radius, zoom),
    }))
}

#[derive(Deserialize)]
struct CoverageQuery {
    latitude: f64,
    longitude: f64,
}

async fn coverage_handler(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<CoverageQuery>, AppError>,
) -> Result<Json<DataResponse<Coverage>>, AppError> {
    let point = Coordinate::new(query.latitude, query.longitude);
    if !point.is_valid() {
        return Err(LocationError::InvalidCoordinate {
            latitude: point.latitude,
            longitude: point.longitude,
        }
        .into());
    }

    let store = state.locations.clone();
    let locations = blocking(move || store.load_all()).await?;
    let hits = LocationBook::new(locations).covering(&point);

    Ok(Json(hits.into()))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<LocationError> for AppError {
    fn from(err: LocationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<GeocodeError> for AppError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::EmptyAddress => AppError::BadRequest(err.to_string()),
            GeocodeError::NotFound(_) => AppError::NotFound(err.to_string()),
            _ => AppError::BadGateway(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid(e) => e.into(),
            StoreError::Book(e @ BookError::OutOfRange { .. }) => AppError::NotFound(e.to_string()),
            StoreError::Book(e @ BookError::InvalidCenter(_)) => {
                AppError::BadRequest(e.to_string())
            }
            StoreError::Io(_) | StoreError::Csv(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => {
                error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
