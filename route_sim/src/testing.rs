//! Test doubles for the panel and the routing service.

use std::{collections::VecDeque, sync::Mutex, time::Duration};

use async_trait::async_trait;
use route_sim_lib::{geo_point::GeoPoint, route::RouteResult};

use crate::{error::RouteError, panel::PanelReporter, routing::Router};

#[derive(Debug, Clone, PartialEq)]
pub enum PanelEntry {
    Report(Option<f64>, Option<f64>, Option<f64>),
    Error(RouteError),
}

#[derive(Debug, Default)]
pub struct RecordingPanel {
    entries: Vec<PanelEntry>,
}

impl RecordingPanel {
    pub fn entries(&self) -> &[PanelEntry] {
        &self.entries
    }

    pub fn reports(&self) -> Vec<&PanelEntry> {
        self.entries.iter().filter(|entry| matches!(entry, PanelEntry::Report(..))).collect()
    }

    pub fn errors(&self) -> Vec<&RouteError> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                PanelEntry::Error(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    pub fn last(&self) -> Option<&PanelEntry> {
        self.entries.last()
    }
}

impl PanelReporter for RecordingPanel {
    fn report(&mut self, distance_km: Option<f64>, time_min: Option<f64>, speed_kmh: Option<f64>) {
        self.entries.push(PanelEntry::Report(distance_km, time_min, speed_kmh));
    }

    fn notify_error(&mut self, error: &RouteError) {
        self.entries.push(PanelEntry::Error(error.clone()));
    }
}

/// Answers requests in order from a script, each after its own delay.
#[derive(Debug, Default)]
pub struct ScriptedRouter {
    script: Mutex<VecDeque<(Duration, Result<RouteResult, RouteError>)>>,
    requests: Mutex<Vec<(GeoPoint, GeoPoint)>>,
}

impl ScriptedRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, delay: Duration, result: Result<RouteResult, RouteError>) -> Self {
        self.script.lock().unwrap().push_back((delay, result));
        self
    }

    pub fn requests(&self) -> Vec<(GeoPoint, GeoPoint)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Router for ScriptedRouter {
    async fn request_route(&self, from: GeoPoint, to: GeoPoint) -> Result<RouteResult, RouteError> {
        self.requests.lock().unwrap().push((from, to));
        let next = self.script.lock().unwrap().pop_front();
        let Some((delay, result)) = next else {
            return Err(RouteError::Transport("script exhausted".into()));
        };
        tokio::time::sleep(delay).await;
        result
    }
}

/// `n` points on a line of latitude.
pub fn route(n: usize, distance_m: f64, time_s: f64) -> RouteResult {
    let coordinates = (0..n).map(|i| GeoPoint::new(56., 10. + i as f64 * 0.01)).collect();
    RouteResult::new(distance_m, time_s, coordinates)
}
