use std::fmt;

use serde::{Deserialize, Serialize};

use super::{geo_point::GeoPoint, route::RouteResult, util::path_length};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsError {
    EmptyPath,
    NegativeDistance,
    NegativeTime,
    NotFinite,
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::EmptyPath => write!(f, "Path has no points"),
            MetricsError::NegativeDistance => write!(f, "Total distance is negative"),
            MetricsError::NegativeTime => write!(f, "Total time is negative"),
            MetricsError::NotFinite => write!(f, "Total distance or time is not a finite number"),
        }
    }
}

impl std::error::Error for MetricsError {}

/// A resolved route, fixed for the lifetime of one simulation.
///
/// There are no setters: a new route means a new `PathMetrics`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PathMetrics {
    total_distance_km: f64,
    total_time_min: f64,
    points: Vec<GeoPoint>,
}

impl PathMetrics {
    pub fn new(total_distance_km: f64, total_time_min: f64, points: Vec<GeoPoint>) -> Result<Self, MetricsError> {
        if points.is_empty() {
            return Err(MetricsError::EmptyPath);
        }
        if !total_distance_km.is_finite() || !total_time_min.is_finite() {
            return Err(MetricsError::NotFinite);
        }
        if total_distance_km < 0. {
            return Err(MetricsError::NegativeDistance);
        }
        if total_time_min < 0. {
            return Err(MetricsError::NegativeTime);
        }

        Ok(Self {
            total_distance_km,
            total_time_min,
            points,
        })
    }

    pub fn from_route(route: RouteResult) -> Result<Self, MetricsError> {
        Self::new(
            route.total_distance_meters / 1000.,
            route.total_time_seconds / 60.,
            route.coordinates,
        )
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    pub fn total_time_min(&self) -> f64 {
        self.total_time_min
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Never 0.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Geometric length of the point sequence, independent of the reported total.
    pub fn path_length_km(&self) -> f64 {
        path_length(&self.points)
    }

    /// Remaining distance, time and speed once `index` points have been passed.
    ///
    /// Progress is counted in points, not in distance, so unevenly spaced points
    /// make the simulated vehicle appear to change speed.
    pub fn reading_at(&self, index: usize) -> Reading {
        let progress = index.min(self.points.len()) as f64 / self.points.len() as f64;
        Reading::from_remaining(
            self.total_distance_km * (1. - progress),
            self.total_time_min * (1. - progress),
        )
    }
}

/// One (distance, time, speed) triple for the panel.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Reading {
    pub distance_km: f64,
    pub time_min: f64,
    pub speed_kmh: f64,
}

impl Reading {
    pub fn from_remaining(distance_km: f64, time_min: f64) -> Self {
        // With no time left the speed falls back to the distance itself. The
        // units don't match, but this is what the panel has always shown.
        let speed_kmh = if time_min > 0. {
            distance_km / (time_min / 60.)
        } else {
            distance_km
        };

        Self {
            distance_km,
            time_min,
            speed_kmh,
        }
    }
}
