use std::{
    ops::ControlFlow,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use route_sim_lib::{geo_point::GeoPoint, path_metrics::PathMetrics, route::RouteResult};
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        watch,
    },
    task::JoinHandle,
};

use crate::{
    clock::ClockId,
    error::RouteError,
    event::{Event, RequestId},
    map::{MapView, MarkerHandle, OverlayHandle},
    panel::PanelReporter,
    routing::Router,
    simulator::{ProgressSimulator, SimulatorState, TickOutcome},
};

pub const POINT_A_LABEL: &str = "Point A";
pub const POINT_B_LABEL: &str = "Point B";
pub const VEHICLE_LABEL: &str = "Vehicle";

/// Decides what a map click means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    PointAChosen,
    RouteActive,
}

/// Snapshot published after every handled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub session: SessionState,
    pub simulator: SimulatorState,
    pub current_index: usize,
    pub route_pending: bool,
    /// Map clicks and user controls handled so far.
    pub commands_handled: u64,
}

struct Endpoint {
    point: GeoPoint,
    marker: MarkerHandle,
}

struct PendingRoute {
    id: RequestId,
    task: JoinHandle<()>,
}

impl Drop for PendingRoute {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One user's route session: two clicks pick the endpoints, the route is
/// played back, a reset starts over.
///
/// All state is owned here and only touched from the task running
/// [`Session::run`] (or directly through `&mut self` in tests).
pub struct Session<M: MapView, P: PanelReporter> {
    router: Arc<dyn Router>,
    map: M,
    panel: P,
    simulator: ProgressSimulator,

    events: UnboundedSender<Event>,
    status: watch::Sender<SessionStatus>,
    commands_sent: Arc<AtomicU64>,
    commands_handled: u64,

    state: SessionState,
    point_a: Option<Endpoint>,
    point_b: Option<Endpoint>,
    pending: Option<PendingRoute>,
    requests_sent: u64,

    route_overlay: Option<OverlayHandle>,
    vehicle: Option<MarkerHandle>,
}

impl<M: MapView, P: PanelReporter> Session<M, P> {
    pub fn new(router: Arc<dyn Router>, map: M, panel: P, tick_period: Duration) -> (Self, UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        let simulator = ProgressSimulator::new(tick_period, events.clone());
        let (status, _) = watch::channel(SessionStatus {
            session: SessionState::Empty,
            simulator: SimulatorState::Idle,
            current_index: 0,
            route_pending: false,
            commands_handled: 0,
        });

        let session = Self {
            router,
            map,
            panel,
            simulator,
            events,
            status,
            commands_sent: Arc::new(AtomicU64::new(0)),
            commands_handled: 0,
            state: SessionState::Empty,
            point_a: None,
            point_b: None,
            pending: None,
            requests_sent: 0,
            route_overlay: None,
            vehicle: None,
        };

        (session, rx)
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            events: self.events.clone(),
            status: self.status.subscribe(),
            commands_sent: self.commands_sent.clone(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session: self.state,
            simulator: self.simulator.state(),
            current_index: self.simulator.current_index(),
            route_pending: self.pending.is_some(),
            commands_handled: self.commands_handled,
        }
    }

    pub fn simulator(&self) -> &ProgressSimulator {
        &self.simulator
    }

    pub fn metrics(&self) -> Option<&PathMetrics> {
        self.simulator.metrics()
    }

    pub fn point_a(&self) -> Option<GeoPoint> {
        self.point_a.as_ref().map(|endpoint| endpoint.point)
    }

    pub fn point_b(&self) -> Option<GeoPoint> {
        self.point_b.as_ref().map(|endpoint| endpoint.point)
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Processes events until `Event::Shutdown`, then stops the simulation and
    /// hands the session back.
    ///
    /// Existing handles are disconnected on return: later commands are refused
    /// and waiting on their status yields `None`.
    pub async fn run(mut self, mut events: UnboundedReceiver<Event>) -> Self {
        while let Some(event) = events.recv().await {
            if self.handle_event(event).is_break() {
                break;
            }
        }

        events.close();
        self.simulator.stop();
        self.pending = None;
        self.publish_status();

        // Replacing the sender closes the channel every handle watches
        let (status, _) = watch::channel(self.status());
        self.status = status;

        tracing::info!("Session ended");
        self
    }

    pub fn handle_event(&mut self, event: Event) -> ControlFlow<()> {
        if matches!(event, Event::MapClick(_) | Event::Pause | Event::Resume | Event::Reset) {
            self.commands_handled += 1;
        }

        match event {
            Event::MapClick(point) => self.on_map_click(point),
            Event::Pause => self.pause(),
            Event::Resume => self.resume(),
            Event::Reset => self.reset(),
            Event::Tick(clock) => self.on_tick(clock),
            Event::RouteResolved { request, result } => self.on_route_resolved(request, result),
            Event::Shutdown => return ControlFlow::Break(()),
        }

        self.publish_status();
        ControlFlow::Continue(())
    }

    pub fn on_map_click(&mut self, point: GeoPoint) {
        match self.state {
            SessionState::RouteActive => {
                self.reset();
                self.choose_point_a(point);
            }
            SessionState::Empty => self.choose_point_a(point),
            SessionState::PointAChosen => self.choose_point_b(point),
        }
    }

    pub fn pause(&mut self) {
        self.simulator.pause();
    }

    pub fn resume(&mut self) {
        self.simulator.resume();
    }

    /// Clears everything from any state. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.simulator.stop();
        self.pending = None;

        if let Some(vehicle) = self.vehicle.take() {
            self.map.remove_marker(vehicle);
        }
        if let Some(overlay) = self.route_overlay.take() {
            self.map.remove_overlay(overlay);
        }
        for endpoint in [self.point_a.take(), self.point_b.take()].into_iter().flatten() {
            self.map.remove_marker(endpoint.marker);
        }

        if self.state != SessionState::Empty {
            tracing::info!("Session reset");
        }
        self.state = SessionState::Empty;
        self.panel.clear();
    }

    fn choose_point_a(&mut self, point: GeoPoint) {
        let marker = self.map.place_marker(point, POINT_A_LABEL);
        self.point_a = Some(Endpoint { point, marker });
        self.state = SessionState::PointAChosen;
        tracing::info!("Point A set to {}", point);
    }

    fn choose_point_b(&mut self, point: GeoPoint) {
        let Some(from) = self.point_a() else {
            tracing::error!("Point B chosen without a Point A");
            return;
        };

        // A newer Point B supersedes a request still in flight
        if let Some(previous) = self.point_b.take() {
            self.map.remove_marker(previous.marker);
        }
        if let Some(pending) = self.pending.take() {
            tracing::debug!("Cancelling route request {:?}", pending.id);
        }

        let marker = self.map.place_marker(point, POINT_B_LABEL);
        self.point_b = Some(Endpoint { point, marker });
        tracing::info!("Point B set to {}", point);

        self.request_route(from, point);
    }

    fn request_route(&mut self, from: GeoPoint, to: GeoPoint) {
        self.requests_sent += 1;
        let id = RequestId(self.requests_sent);

        let router = self.router.clone();
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let result = router.request_route(from, to).await;
            // The session may be gone already
            let _ = events.send(Event::RouteResolved { request: id, result });
        });

        tracing::info!("Requested route {:?} from {} to {}", id, from, to);
        self.pending = Some(PendingRoute { id, task });
    }

    fn on_route_resolved(&mut self, request: RequestId, result: Result<RouteResult, RouteError>) {
        if self.pending.as_ref().map(|pending| pending.id) != Some(request) {
            tracing::debug!("Discarding stale route result {:?}", request);
            return;
        }
        self.pending = None;

        let metrics = result.and_then(|route| PathMetrics::from_route(route).map_err(RouteError::from));

        match metrics {
            Ok(metrics) => self.activate_route(metrics),
            Err(err) => self.route_failed(err),
        }
    }

    fn activate_route(&mut self, metrics: PathMetrics) {
        let start = metrics.points()[0];
        self.route_overlay = Some(self.map.show_route(metrics.points()));
        self.vehicle = Some(self.map.place_marker(start, VEHICLE_LABEL));

        tracing::info!(
            "Route found: {:.2} km, {:.1} min, {} points ({:.2} km along the points)",
            metrics.total_distance_km(),
            metrics.total_time_min(),
            metrics.point_count(),
            metrics.path_length_km()
        );

        self.panel.show_reading(&metrics.reading_at(0));
        self.simulator.start(metrics);
        self.state = SessionState::RouteActive;
    }

    fn route_failed(&mut self, err: RouteError) {
        tracing::warn!("Route request failed: {}", err);

        if let Some(point_b) = self.point_b.take() {
            self.map.remove_marker(point_b.marker);
        }
        self.state = SessionState::PointAChosen;
        self.panel.notify_error(&err);
    }

    fn on_tick(&mut self, clock: ClockId) {
        match self.simulator.tick(clock, &mut self.panel) {
            TickOutcome::Advanced { position, .. } => {
                if let Some(vehicle) = self.vehicle {
                    self.map.move_marker(vehicle, position);
                }
            }
            TickOutcome::Completed => {
                tracing::info!("Vehicle arrived at Point B");
            }
            TickOutcome::Ignored => {}
        }
    }

    fn publish_status(&self) {
        self.status.send_replace(self.status());
    }
}

/// Cloneable front door to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    events: UnboundedSender<Event>,
    status: watch::Receiver<SessionStatus>,
    commands_sent: Arc<AtomicU64>,
}

impl SessionHandle {
    pub fn click(&self, point: GeoPoint) {
        self.send_command(Event::MapClick(point));
    }

    pub fn pause(&self) {
        self.send_command(Event::Pause);
    }

    pub fn resume(&self) {
        self.send_command(Event::Resume);
    }

    pub fn reset(&self) {
        self.send_command(Event::Reset);
    }

    pub fn shutdown(&self) {
        let _ = self.send(Event::Shutdown);
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Waits for a status matching `predicate`. `None` if the session is gone.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&SessionStatus) -> bool) -> Option<SessionStatus> {
        self.status.wait_for(predicate).await.ok().map(|status| *status)
    }

    /// Waits until every command sent through any handle has been handled.
    pub async fn settled(&mut self) -> Option<SessionStatus> {
        let sent = self.commands_sent.load(Ordering::SeqCst);
        self.wait_for(|status| status.commands_handled >= sent).await
    }

    fn send_command(&self, event: Event) {
        self.commands_sent.fetch_add(1, Ordering::SeqCst);
        if !self.send(event) {
            self.commands_sent.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn send(&self, event: Event) -> bool {
        let sent = self.events.send(event).is_ok();
        if !sent {
            tracing::debug!("Session is no longer running");
        }
        sent
    }
}

pub fn spawn_session<M, P>(
    router: Arc<dyn Router>,
    map: M,
    panel: P,
    tick_period: Duration,
) -> (SessionHandle, JoinHandle<Session<M, P>>)
where
    M: MapView + Send + 'static,
    P: PanelReporter + Send + 'static,
{
    let (session, events) = Session::new(router, map, panel, tick_period);
    let handle = session.handle();
    let task = tokio::spawn(session.run(events));
    (handle, task)
}
