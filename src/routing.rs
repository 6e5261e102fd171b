//! Driving routes from an external directions service (OSRM).
//!
//! OSRM speaks GeoJSON, so geometry arrives as `[lng, lat]` pairs; everything
//! leaving this module is a [`GeoPoint`].

use std::time::Duration;

use serde::Deserialize;

use crate::geo::GeoPoint;

/// Public OSRM demo server.
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

const USER_AGENT: &str = concat!("ambutrack/", env!("CARGO_PKG_VERSION"));

/// A driving route between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: Vec<GeoPoint>,
    /// Travel time in seconds, as reported by the service.
    pub duration_s: Option<f64>,
    /// Route length in metres, as reported by the service.
    pub distance_m: Option<f64>,
}

impl Route {
    pub fn duration_minutes(&self) -> Option<f64> {
        self.duration_s.map(|s| s / 60.0)
    }

    /// `[lat, lng]` pairs for polylines and the tracking record.
    pub fn to_pairs(&self) -> Vec<[f64; 2]> {
        self.path.iter().map(|p| p.to_pair()).collect()
    }
}

/// Routing failures. None of them may clobber a last-known-good route.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Routing service error: {0}")]
    Service(String),
    #[error("Invalid routing response: {0}")]
    InvalidResponse(String),
    #[error("Routing service returned no route")]
    EmptyRoute,
}

/// Anything that can produce a driving route.
pub trait RouteProvider {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<Route, RoutingError>;
}

// ─── OSRM ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    distance: Option<f64>,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Blocking OSRM client.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    base_url: String,
    timeout: Duration,
}

impl OsrmClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn route_url(&self, from: GeoPoint, to: GeoPoint) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, from.longitude, from.latitude, to.longitude, to.latitude,
        )
    }
}

impl Default for OsrmClient {
    fn default() -> Self {
        Self::new(DEFAULT_OSRM_URL)
    }
}

impl RouteProvider for OsrmClient {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<Route, RoutingError> {
        let url = self.route_url(from, to);
        tracing::debug!(%url, "requesting route");

        let body = match ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .call()
        {
            Ok(response) => response
                .into_string()
                .map_err(|e| RoutingError::InvalidResponse(e.to_string()))?,
            // OSRM reports NoRoute and friends as 4xx with a JSON body.
            Err(ureq::Error::Status(status, response)) => match response.into_string() {
                Ok(body) if !body.is_empty() => body,
                _ => return Err(RoutingError::Service(format!("HTTP {}", status))),
            },
            Err(e) => return Err(RoutingError::Network(e.to_string())),
        };

        parse_osrm_response(&body)
    }
}

/// Parse an OSRM `route` response body, taking the first route.
pub fn parse_osrm_response(body: &str) -> Result<Route, RoutingError> {
    let response: OsrmResponse =
        serde_json::from_str(body).map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

    if response.code != "Ok" {
        let detail = response.message.unwrap_or_default();
        return Err(RoutingError::Service(format!("{} {}", response.code, detail).trim_end().to_string()));
    }

    let first = response.routes.into_iter().next().ok_or(RoutingError::EmptyRoute)?;
    if first.geometry.coordinates.is_empty() {
        return Err(RoutingError::EmptyRoute);
    }

    let path = first
        .geometry
        .coordinates
        .iter()
        .map(|&[lng, lat]| {
            GeoPoint::new(lat, lng).map_err(|e| RoutingError::InvalidResponse(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Route {
        path,
        duration_s: first.duration,
        distance_m: first.distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "code": "Ok",
        "routes": [{
            "geometry": {
                "type": "LineString",
                "coordinates": [[78.4867, 17.385], [78.47, 17.39], [78.3983, 17.4108]]
            },
            "duration": 1260.5,
            "distance": 11234.0,
            "legs": []
        }],
        "waypoints": []
    }"#;

    #[test]
    fn test_parse_swaps_coordinates() {
        let route = parse_osrm_response(SAMPLE).unwrap();
        assert_eq!(route.path.len(), 3);
        assert_eq!(route.path[0], GeoPoint { latitude: 17.385, longitude: 78.4867 });
        assert_eq!(route.path[2].latitude, 17.4108);
        assert_eq!(route.to_pairs()[1], [17.39, 78.47]);
        assert_eq!(route.distance_m, Some(11234.0));
        assert!((route.duration_minutes().unwrap() - 21.008).abs() < 0.001);
    }

    #[test]
    fn test_parse_empty_routes() {
        let err = parse_osrm_response(r#"{"code": "Ok", "routes": []}"#).unwrap_err();
        assert!(matches!(err, RoutingError::EmptyRoute));

        let err = parse_osrm_response(r#"{"code": "Ok", "routes": [{"geometry": {"coordinates": []}}]}"#)
            .unwrap_err();
        assert!(matches!(err, RoutingError::EmptyRoute));
    }

    #[test]
    fn test_parse_service_error() {
        let err = parse_osrm_response(r#"{"code": "NoRoute", "message": "Impossible route"}"#).unwrap_err();
        match err {
            RoutingError::Service(msg) => assert_eq!(msg, "NoRoute Impossible route"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_osrm_response("<html>"), Err(RoutingError::InvalidResponse(_))));
        assert!(matches!(
            parse_osrm_response(r#"{"code": "Ok", "routes": [{"geometry": {"coordinates": [[200.0, 10.0]]}}]}"#),
            Err(RoutingError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_route_url_is_lng_lat() {
        let client = OsrmClient::new("http://localhost:5000/");
        let from = GeoPoint { latitude: 17.385, longitude: 78.4867 };
        let to = GeoPoint { latitude: 17.4108, longitude: 78.3983 };
        assert_eq!(
            client.route_url(from, to),
            "http://localhost:5000/route/v1/driving/78.4867,17.385;78.3983,17.4108?overview=full&geometries=geojson"
        );
    }
}
