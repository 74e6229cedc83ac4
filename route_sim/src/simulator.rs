use std::time::Duration;

use route_sim_lib::{
    geo_point::GeoPoint,
    path_metrics::{PathMetrics, Reading},
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    clock::{Clock, ClockId},
    event::Event,
    panel::PanelReporter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Stale clock, or not running.
    Ignored,
    /// The vehicle is now at point `index`.
    Advanced {
        index: usize,
        position: GeoPoint,
        reading: Reading,
    },
    /// Every point has been visited. Nothing was reported.
    Completed,
}

/// Plays a path back one point per tick and reports what is left of it.
///
/// The simulator owns its clock. Stopping, restarting or completing drops the
/// clock, and every tick is checked against the id of the live clock, so a tick
/// from an earlier clock can never move the vehicle or reach the panel.
pub struct ProgressSimulator {
    period: Duration,
    events: UnboundedSender<Event>,

    state: SimulatorState,
    metrics: Option<PathMetrics>,
    current_index: usize,

    clock: Option<Clock>,
    clocks_started: u64,
}

impl ProgressSimulator {
    pub fn new(period: Duration, events: UnboundedSender<Event>) -> Self {
        Self {
            period,
            events,
            state: SimulatorState::Idle,
            metrics: None,
            current_index: 0,
            clock: None,
            clocks_started: 0,
        }
    }

    pub fn state(&self) -> SimulatorState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn metrics(&self) -> Option<&PathMetrics> {
        self.metrics.as_ref()
    }

    pub fn clock_id(&self) -> Option<ClockId> {
        self.clock.as_ref().map(Clock::id)
    }

    /// Starts playing `metrics` from its first point. Anything already playing
    /// is stopped and replaced.
    pub fn start(&mut self, metrics: PathMetrics) {
        if self.state != SimulatorState::Idle {
            self.stop();
        }

        tracing::info!(
            "Starting simulation over {} points ({:.2} km, {:.1} min)",
            metrics.point_count(),
            metrics.total_distance_km(),
            metrics.total_time_min()
        );

        self.metrics = Some(metrics);
        self.current_index = 0;
        self.state = SimulatorState::Running;

        self.clocks_started += 1;
        self.clock = Some(Clock::spawn(ClockId(self.clocks_started), self.period, self.events.clone()));
    }

    pub fn pause(&mut self) {
        if self.state == SimulatorState::Running {
            tracing::info!("Paused at point {}", self.current_index);
            self.state = SimulatorState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == SimulatorState::Paused {
            tracing::info!("Resumed at point {}", self.current_index);
            self.state = SimulatorState::Running;
        }
    }

    /// Back to `Idle` from any state. The clock is dead when this returns.
    pub fn stop(&mut self) {
        self.clock = None;
        self.metrics = None;
        self.current_index = 0;
        if self.state != SimulatorState::Idle {
            tracing::info!("Simulation stopped");
            self.state = SimulatorState::Idle;
        }
    }

    /// Handles one tick of `clock`. The clock keeps ticking while paused; those
    /// ticks do nothing, which is what keeps the position during a pause.
    pub fn tick(&mut self, clock: ClockId, panel: &mut impl PanelReporter) -> TickOutcome {
        if self.clock_id() != Some(clock) {
            tracing::debug!("Ignoring tick from stale clock {:?}", clock);
            return TickOutcome::Ignored;
        }

        if self.state != SimulatorState::Running {
            return TickOutcome::Ignored;
        }

        let Some(metrics) = &self.metrics else {
            return TickOutcome::Ignored;
        };

        if self.current_index >= metrics.point_count() {
            tracing::info!("Simulation completed after {} points", self.current_index);
            self.state = SimulatorState::Completed;
            self.clock = None;
            return TickOutcome::Completed;
        }

        let index = self.current_index;
        let position = metrics.points()[index];
        let reading = metrics.reading_at(index);

        tracing::debug!(
            "Point {}/{}: {:.2} km, {:.1} min, {:.1} km/h",
            index + 1,
            metrics.point_count(),
            reading.distance_km,
            reading.time_min,
            reading.speed_kmh
        );
        panel.show_reading(&reading);

        self.current_index += 1;

        TickOutcome::Advanced {
            index,
            position,
            reading,
        }
    }
}
