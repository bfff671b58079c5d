//! Great-circle distance on a spherical Earth.

/// Earth radius in meters for haversine distance calculations
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Calculate the haversine distance between two coordinates.
///
/// Pure and symmetric; returns 0 for identical points. Accurate to ~0.5%
/// against ellipsoidal models, which is well inside the tolerance of the
/// cell-based candidate generation it backs.
///
/// # Returns
///
/// Distance in meters.
///
/// # Examples
///
/// ```rust
/// use geoseek::distance::haversine_distance;
///
/// // Tokyo Station to Shinjuku Station, roughly 6.2 km
/// let d = haversine_distance(35.6812, 139.7671, 35.6896, 139.7006);
/// assert!(d > 5_500.0 && d < 7_000.0);
/// ```
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Haversine distance in kilometers. Convenience for the codec's
/// radius-sampling path, which works in km.
#[inline]
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_distance(lat1, lon1, lat2, lon2) / 1000.0
}
