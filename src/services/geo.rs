//! Geographic calculations

use crate::types::Coordinates;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate Haversine distance between two points in kilometers
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Estimated road distance in meters and travel time in seconds
pub fn estimate_leg(
    from: &Coordinates,
    to: &Coordinates,
    road_coefficient: f64,
    average_speed_kmh: f64,
) -> (u64, u64) {
    let road_km = haversine_distance(from, to) * road_coefficient;
    let distance_m = (road_km * 1000.0).round() as u64;
    let duration_s = (road_km / average_speed_kmh * 3600.0).round() as u64;
    (distance_m, duration_s)
}

/// Bounding box `(min, max)` of a set of points
pub fn bounding_box(points: &[Coordinates]) -> Option<(Coordinates, Coordinates)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &points[1..] {
        min.lat = min.lat.min(p.lat);
        min.lng = min.lng.min(p.lng);
        max.lat = max.lat.max(p.lat);
        max.lng = max.lng.max(p.lng);
    }
    Some((min, max))
}
