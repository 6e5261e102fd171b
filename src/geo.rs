//! Geodesy primitives: points on a spherical Earth and the distance between them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::facility::ResolveError;

/// Mean Earth radius used for all great-circle math.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a validated point. Latitude must lie in -90..=90, longitude in -180..=180.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ResolveError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ResolveError::InvalidArgument(format!(
                "latitude {} outside -90..90",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ResolveError::InvalidArgument(format!(
                "longitude {} outside -180..180",
                longitude
            )));
        }
        Ok(Self { latitude, longitude })
    }

    /// `[lat, lng]` pair, the order map polylines expect.
    pub fn to_pair(self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_coords(self.latitude, self.longitude))
    }
}

/// Haversine distance in kilometres.
///
/// Coincident points give 0 and antipodal points give about πR. `h` is
/// clamped to [0, 1]: near-antipodal pairs can round just past 1.
pub fn great_circle_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Linear interpolation between two points, `t` in [0, 1].
///
/// Good enough for the short hops between consecutive position samples;
/// not a geodesic interpolation.
pub fn interpolate(a: GeoPoint, b: GeoPoint, t: f64) -> GeoPoint {
    let t = t.clamp(0.0, 1.0);
    GeoPoint {
        latitude: a.latitude + (b.latitude - a.latitude) * t,
        longitude: a.longitude + (b.longitude - a.longitude) * t,
    }
}

/// Human-readable coordinates, e.g. `17.3850°N, 78.4867°E`.
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", lat.abs(), ns, lon.abs(), ew)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        for pt in [p(0.0, 0.0), p(17.385, 78.4867), p(-89.9, 179.9), p(90.0, -180.0)] {
            assert_eq!(great_circle_distance_km(pt, pt), 0.0);
        }
    }

    #[test]
    fn test_distance_symmetric() {
        let pairs = [
            (p(17.3850, 78.4867), p(17.4108, 78.3983)),
            (p(59.3293, 18.0686), p(-33.8688, 151.2093)),
            (p(-45.0, -170.0), p(45.0, 170.0)),
        ];
        for (a, b) in pairs {
            assert_abs_diff_eq!(
                great_circle_distance_km(a, b),
                great_circle_distance_km(b, a),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = great_circle_distance_km(p(0.0, 0.0), p(0.0, 180.0));
        assert_abs_diff_eq!(d, PI * EARTH_RADIUS_KM, epsilon = 1e-6);

        let poles = great_circle_distance_km(p(90.0, 0.0), p(-90.0, 0.0));
        assert_abs_diff_eq!(poles, PI * EARTH_RADIUS_KM, epsilon = 1e-6);
    }

    #[test]
    fn test_near_antipodal_rounding_stays_finite() {
        let d = great_circle_distance_km(p(-87.843, -180.0), p(87.843, 0.0));
        assert!(d.is_finite(), "got {}", d);
        assert_abs_diff_eq!(d, PI * EARTH_RADIUS_KM, epsilon = 1e-3);

        for i in 0..2000 {
            let lat = -89.0 + (i as f64) * 0.089;
            let lon = -180.0 + (i as f64) * 0.09;
            let d = great_circle_distance_km(p(lat, lon), p(-lat, lon + 180.0));
            assert!(d.is_finite(), "NaN for ({}, {})", lat, lon);
        }
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = great_circle_distance_km(p(0.0, 0.0), p(1.0, 0.0));
        assert_abs_diff_eq!(d, EARTH_RADIUS_KM * PI / 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hyderabad_checkpoint() {
        // City Hospital to Apollo Hospital, roughly 9.8 km as the crow flies.
        let d = great_circle_distance_km(p(17.3850, 78.4867), p(17.4108, 78.3983));
        assert!(d > 9.5 && d < 10.0, "got {}", d);
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(GeoPoint::new(90.5, 0.0).is_err());
        assert!(GeoPoint::new(-91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, 180.1).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_interpolate_endpoints_and_midpoint() {
        let a = p(17.0, 78.0);
        let b = p(18.0, 79.0);
        assert_eq!(interpolate(a, b, 0.0), a);
        assert_eq!(interpolate(a, b, 1.0), b);
        let mid = interpolate(a, b, 0.5);
        assert_abs_diff_eq!(mid.latitude, 17.5, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.longitude, 78.5, epsilon = 1e-12);
        assert_eq!(interpolate(a, b, 3.0), b);
    }

    #[test]
    fn test_serde_uses_lat_lng() {
        let json = serde_json::to_value(p(17.385, 78.4867)).unwrap();
        assert_eq!(json["lat"], 17.385);
        assert_eq!(json["lng"], 78.4867);
    }

    #[test]
    fn test_format_coords() {
        assert_eq!(format_coords(17.385, 78.4867), "17.3850\u{00B0}N, 78.4867\u{00B0}E");
        assert_eq!(format_coords(-33.8688, -70.0), "33.8688\u{00B0}S, 70.0000\u{00B0}W");
    }
}
