use chrono::{DateTime, Local, TimeDelta, TimeZone};
use route_sim_lib::path_metrics::Reading;

use crate::error::RouteError;

pub const PLACEHOLDER: &str = "-";

/// Where readings end up. `None` means "no data" and is shown as a placeholder.
pub trait PanelReporter {
    fn report(&mut self, distance_km: Option<f64>, time_min: Option<f64>, speed_kmh: Option<f64>);

    fn notify_error(&mut self, error: &RouteError);

    fn show_reading(&mut self, reading: &Reading) {
        self.report(Some(reading.distance_km), Some(reading.time_min), Some(reading.speed_kmh));
    }

    fn clear(&mut self) {
        self.report(None, None, None);
    }
}

/// Prints one line per report to stdout.
#[derive(Debug, Default)]
pub struct ConsolePanel;

impl PanelReporter for ConsolePanel {
    fn report(&mut self, distance_km: Option<f64>, time_min: Option<f64>, speed_kmh: Option<f64>) {
        println!("{}", format_panel(distance_km, time_min, speed_kmh, Local::now()));
    }

    fn notify_error(&mut self, error: &RouteError) {
        if error.is_no_route() {
            println!("No route between the chosen points. Click a new Point B.");
        } else {
            println!("Routing failed: {error}. Click a new Point B to retry.");
        }
    }
}

pub fn format_panel<Tz: TimeZone>(
    distance_km: Option<f64>,
    time_min: Option<f64>,
    speed_kmh: Option<f64>,
    now: DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let distance = distance_km.map(|d| format!("{d:.2}")).unwrap_or_else(|| PLACEHOLDER.into());
    let eta = time_min.map(|t| format!("{t:.1}")).unwrap_or_else(|| PLACEHOLDER.into());
    let speed = speed_kmh.map(|s| format!("{s:.1}")).unwrap_or_else(|| PLACEHOLDER.into());
    let arrival = time_min
        .and_then(|t| TimeDelta::try_milliseconds((t * 60_000.) as i64))
        .and_then(|remaining| now.checked_add_signed(remaining))
        .map(|at| at.format("%H:%M").to_string())
        .unwrap_or_else(|| PLACEHOLDER.into());

    format!("Distance: {distance} km | ETA: {eta} min | Speed: {speed} km/h | Arrival: {arrival}")
}
