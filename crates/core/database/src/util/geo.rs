//! Spherical geometry helpers for duplicate detection and hotspot
//! bucketing. Degrees of latitude and longitude cover different ground
//! distances, so comparisons always go through great-circle distance
//! rather than coordinate deltas.

/// Mean Earth radius (metres)
const EARTH_RADIUS_METRES: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates (metres), haversine formula
pub fn haversine_metres(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METRES * a.sqrt().asin()
}

/// Spatial bucket for a coordinate, rounded to 3 decimal places
/// (cells of roughly 110 m)
pub fn cell_key(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.3},{longitude:.3}")
}

/// Coordinate bounds guaranteed to contain every point within
/// `radius_metres` of the centre, used to pre-filter nearby queries
pub fn bounding_box(
    latitude: f64,
    longitude: f64,
    radius_metres: f64,
) -> (f64, f64, f64, f64) {
    let d_lat = radius_metres / EARTH_RADIUS_METRES;
    // Longitude degrees shrink with latitude; clamp the divisor so the
    // box stays finite near the poles.
    let d_lng = d_lat / latitude.to_radians().cos().abs().max(0.01);

    (
        latitude - d_lat.to_degrees(),
        latitude + d_lat.to_degrees(),
        longitude - d_lng.to_degrees(),
        longitude + d_lng.to_degrees(),
    )
}
