use serde::{Deserialize, Serialize};

// mean Earth radius
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Great-circle distance between two points in meters, using the
    /// haversine formula on a sphere. Symmetric, non-negative, and zero for
    /// equal coordinates.
    pub fn haversine_distance(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lng = (other.longitude - self.longitude).to_radians();

        let a =
            (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_METERS * c
    }
}

/// One reported position from the sample source.
///
/// `speed_mps` is `None` when the sensor did not report an instantaneous
/// speed for this fix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoSample {
    pub point: GeoPoint,
    pub timestamp_ms: i64,
    pub speed_mps: Option<f64>,
}
