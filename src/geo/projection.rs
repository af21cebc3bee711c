//! Conversions from ground distance to on-screen pixels
//!
//! Both functions assume Web Mercator tiles of 256 pixels and measure at the
//! equator. There is no latitude correction, so circles drawn far from the
//! equator come out smaller than their true footprint.

/// Equatorial circumference in kilometers
pub const EQUATOR_CIRCUMFERENCE_KM: f64 = 40075.0;

/// Tile edge in pixels
pub const TILE_SIZE: f64 = 256.0;

/// Pixels-per-kilometer stops the map style interpolates between, keyed by zoom
pub const CIRCLE_ZOOM_STOPS: [(f64, f64); 5] = [
    (0.0, 0.1),
    (5.0, 1.0),
    (10.0, 10.0),
    (15.0, 50.0),
    (20.0, 100.0),
];

/// Pixel radius of a circle of `radius_km` at the given zoom level
pub fn pixel_radius(radius_km: f64, zoom: f64) -> f64 {
    let pixels_per_degree = 2f64.powf(zoom) * TILE_SIZE / 360.0;
    let km_per_degree = EQUATOR_CIRCUMFERENCE_KM / 360.0;

    radius_km * pixels_per_degree / km_per_degree
}

/// Pixel radius as rendered by the map's linear zoom interpolation
pub fn interpolated_circle_radius(radius_km: f64, zoom: f64) -> f64 {
    let (first_zoom, first_scale) = CIRCLE_ZOOM_STOPS[0];
    let (last_zoom, last_scale) = CIRCLE_ZOOM_STOPS[CIRCLE_ZOOM_STOPS.len() - 1];

    let scale = if zoom <= first_zoom {
        first_scale
    } else if zoom >= last_zoom {
        last_scale
    } else {
        CIRCLE_ZOOM_STOPS
            .windows(2)
            .find(|pair| zoom <= pair[1].0)
            .map(|pair| {
                let (z0, s0) = pair[0];
                let (z1, s1) = pair[1];
                s0 + (s1 - s0) * (zoom - z0) / (z1 - z0)
            })
            .unwrap_or(last_scale)
    };

    radius_km * scale
}
