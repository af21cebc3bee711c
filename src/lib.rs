//! Franchise Radius Server - store locations and their service circles
//!
//! The library holds everything the binary serves:
//! - geodesic distance, circle containment and zoom-dependent pixel radius
//! - the ordered location list and its CSV persistence
//! - a rate-limited Nominatim geocoding client
//! - the axum router exposing the backend API

pub mod app;
pub mod config;
pub mod geo;
pub mod geocode;
pub mod http;
pub mod store;
pub mod util;

pub use app::AppState;
pub use config::Config;
pub use http::build_router;
