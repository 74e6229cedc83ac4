use async_trait::async_trait;
use geo_types::Point;
use reqwest::Client;
use route_sim_lib::{geo_point::GeoPoint, route::RouteResult};
use serde::Deserialize;

use super::Router;
use crate::{config::OsrmConfig, error::RouteError};

/// Client for an OSRM compatible `route` service.
#[derive(Debug, Clone)]
pub struct OsrmRouter {
    client: Client,
    base_url: String,
    profile: String,
}

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    // GeoJSON order: [lng, lat]
    coordinates: Vec<[f64; 2]>,
}

impl OsrmRouter {
    pub fn new(config: &OsrmConfig) -> Result<Self, RouteError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
        })
    }

    pub fn route_url(&self, from: GeoPoint, to: GeoPoint) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson",
            self.base_url, self.profile, from.longitude, from.latitude, to.longitude, to.latitude
        )
    }
}

#[async_trait]
impl Router for OsrmRouter {
    async fn request_route(&self, from: GeoPoint, to: GeoPoint) -> Result<RouteResult, RouteError> {
        let url = self.route_url(from, to);
        tracing::debug!("Requesting route: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // OSRM answers most failures with a JSON body and a 4xx status, so the
        // body decides. Only an unreadable body falls back to the status.
        parse_route(&body).map_err(|err| match err {
            RouteError::InvalidResponse(_) if !status.is_success() => {
                RouteError::Transport(format!("HTTP {}", status))
            }
            other => other,
        })
    }
}

pub(crate) fn parse_route(body: &str) -> Result<RouteResult, RouteError> {
    let response: OsrmResponse =
        serde_json::from_str(body).map_err(|err| RouteError::InvalidResponse(err.to_string()))?;

    match response.code.as_str() {
        "Ok" => {
            let Some(route) = response.routes.into_iter().next() else {
                return Err(RouteError::NotFound);
            };

            let coordinates = route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| GeoPoint::from(Point::new(lng, lat)))
                .collect();

            Ok(RouteResult::new(route.distance, route.duration, coordinates))
        }
        "NoRoute" | "NoSegment" => Err(RouteError::NotFound),
        _ => Err(RouteError::Service {
            message: response.message.unwrap_or_default(),
            code: response.code,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parses_ok_response() {
        let body = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 1520.4,
                "duration": 183.1,
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[10.196123, 56.175188], [10.2, 56.18], [10.21, 56.19]]
                },
                "legs": []
            }],
            "waypoints": []
        }"#;

        let route = parse_route(body).unwrap();
        assert_eq!(route.total_distance_meters, 1520.4);
        assert_eq!(route.total_time_seconds, 183.1);
        assert_eq!(route.coordinates.len(), 3);
        assert_eq!(route.coordinates[0], GeoPoint::new(56.175188, 10.196123));
    }

    #[test]
    fn empty_geometry_is_still_parsed() {
        // Rejected later when turned into path metrics
        let body = r#"{"code":"Ok","routes":[{"distance":0,"duration":0,"geometry":{"coordinates":[]}}]}"#;
        assert!(parse_route(body).unwrap().coordinates.is_empty());
    }

    #[test]
    fn maps_failures() {
        assert_eq!(parse_route(r#"{"code":"NoRoute","message":"Impossible route"}"#), Err(RouteError::NotFound));
        assert_eq!(parse_route(r#"{"code":"Ok","routes":[]}"#), Err(RouteError::NotFound));
        assert_eq!(
            parse_route(r#"{"code":"TooBig","message":"Too many points"}"#),
            Err(RouteError::Service {
                code: "TooBig".into(),
                message: "Too many points".into()
            })
        );
        assert!(matches!(parse_route("<html>busy</html>"), Err(RouteError::InvalidResponse(_))));
    }

    #[test]
    fn builds_lng_lat_url() {
        let router = OsrmRouter::new(&OsrmConfig {
            base_url: "http://localhost:5000/".into(),
            profile: "driving".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        assert_eq!(
            router.route_url(GeoPoint::new(56.1, 10.2), GeoPoint::new(55.5, 9.5)),
            "http://localhost:5000/route/v1/driving/10.200000,56.100000;9.500000,55.500000?overview=full&geometries=geojson"
        );
    }

    #[tokio::test]
    #[ignore = "needs a local network stack that refuses port 9"]
    async fn unreachable_service_is_transport_error() {
        let router = OsrmRouter::new(&OsrmConfig {
            base_url: "http://127.0.0.1:9".into(),
            profile: "driving".into(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        let result = router.request_route(GeoPoint::new(0., 0.), GeoPoint::new(1., 1.)).await;
        assert!(matches!(result, Err(RouteError::Transport(_))));
    }
}
