use serde::{Deserialize, Serialize};

use super::geo_point::GeoPoint;

/// What a routing service answers for a pair of endpoints.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteResult {
    pub total_distance_meters: f64,
    pub total_time_seconds: f64,
    /// Road-following path, usually much finer than the two endpoints.
    pub coordinates: Vec<GeoPoint>,
}

impl RouteResult {
    pub fn new(total_distance_meters: f64, total_time_seconds: f64, coordinates: Vec<GeoPoint>) -> Self {
        Self {
            total_distance_meters,
            total_time_seconds,
            coordinates,
        }
    }
}
