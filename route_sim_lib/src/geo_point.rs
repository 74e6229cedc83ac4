use std::{fmt, str::FromStr};

use geo_types::Point;
use serde::{Deserialize, Serialize};

/// A position on the map in degrees.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Straight line towards `other`, `t` in [0, 1].
    pub fn lerp(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        GeoPoint::new(
            self.latitude + (other.latitude - self.latitude) * t,
            self.longitude + (other.longitude - self.longitude) * t,
        )
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

// geo-types uses x = longitude, y = latitude
impl From<Point<f64>> for GeoPoint {
    fn from(point: Point<f64>) -> Self {
        GeoPoint::new(point.y(), point.x())
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(point: GeoPoint) -> Self {
        Point::new(point.longitude, point.latitude)
    }
}

impl FromStr for GeoPoint {
    type Err = &'static str;

    /// Parses `"lat,lng"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s.split_once(',').ok_or("Expected a point as LAT,LNG")?;
        let latitude = lat.trim().parse::<f64>().map_err(|_| "Latitude is not a number")?;
        let longitude = lng.trim().parse::<f64>().map_err(|_| "Longitude is not a number")?;

        if !(-90.0..=90.0).contains(&latitude) {
            return Err("Latitude must be within [-90, 90]");
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err("Longitude must be within [-180, 180]");
        }

        Ok(GeoPoint::new(latitude, longitude))
    }
}
