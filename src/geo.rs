// Coordinates and great-circle distance for the radius filter and closest sort

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance in kilometres (haversine formula).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let lat_cos = self.lat.to_radians().cos() * other.lat.to_radians().cos();
        let a = (d_lat / 2.0).sin().powi(2) + lat_cos * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let copenhagen = GeoPoint::new(55.6761, 12.5683);
        assert!(copenhagen.distance_km(&copenhagen).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        // Copenhagen to Aarhus is roughly 157 km as the crow flies
        let copenhagen = GeoPoint::new(55.6761, 12.5683);
        let aarhus = GeoPoint::new(56.1629, 10.2039);
        let distance = copenhagen.distance_km(&aarhus);
        assert!((150.0..165.0).contains(&distance), "got {distance}");
        assert!((distance - aarhus.distance_km(&copenhagen)).abs() < 1e-9);
    }
}
