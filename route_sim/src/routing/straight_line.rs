use async_trait::async_trait;
use route_sim_lib::{geo_point::GeoPoint, route::RouteResult, util::haversine_distance};

use super::Router;
use crate::{config::StraightLineConfig, error::RouteError};

/// Offline router: a straight line between the endpoints, driven at a fixed speed.
#[derive(Debug, Clone)]
pub struct StraightLineRouter {
    speed_kmh: f64,
    segments: usize,
}

impl StraightLineRouter {
    pub fn new(config: &StraightLineConfig) -> Self {
        Self {
            speed_kmh: config.speed_kmh,
            segments: config.segments.max(1),
        }
    }

    pub fn route(&self, from: GeoPoint, to: GeoPoint) -> RouteResult {
        let coordinates = (0..=self.segments)
            .map(|i| from.lerp(&to, i as f64 / self.segments as f64))
            .collect();

        let distance_km = haversine_distance(&from, &to);
        let time_h = distance_km / self.speed_kmh;

        RouteResult::new(distance_km * 1000., time_h * 3600., coordinates)
    }
}

#[async_trait]
impl Router for StraightLineRouter {
    async fn request_route(&self, from: GeoPoint, to: GeoPoint) -> Result<RouteResult, RouteError> {
        Ok(self.route(from, to))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn router(speed_kmh: f64, segments: usize) -> StraightLineRouter {
        StraightLineRouter::new(&StraightLineConfig { speed_kmh, segments })
    }

    #[tokio::test]
    async fn interpolates_between_endpoints() {
        let from = GeoPoint::new(56., 10.);
        let to = GeoPoint::new(57., 11.);
        let route = router(60., 4).request_route(from, to).await.unwrap();

        assert_eq!(route.coordinates.len(), 5);
        assert_eq!(route.coordinates[0], from);
        assert_eq!(route.coordinates[4], to);
        assert_relative_eq!(route.coordinates[2].latitude, 56.5);
        assert_relative_eq!(route.coordinates[2].longitude, 10.5);

        let distance_km = haversine_distance(&from, &to);
        assert_relative_eq!(route.total_distance_meters, distance_km * 1000.);
        // 60 km/h: one minute per km
        assert_relative_eq!(route.total_time_seconds, distance_km * 60., max_relative = 1e-12);
    }

    #[test]
    fn same_point_is_a_zero_route() {
        let point = GeoPoint::new(1., 1.);
        let route = router(50., 3).route(point, point);
        assert_eq!(route.total_distance_meters, 0.);
        assert_eq!(route.total_time_seconds, 0.);
        assert_eq!(route.coordinates.len(), 4);
    }
}
