use route_sim_lib::{geo_point::GeoPoint, route::RouteResult};

use crate::{clock::ClockId, error::RouteError};

/// Identifies one route request. Only the newest request of a session counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// Everything the session reacts to. All of it arrives over one channel, so a
/// session only ever runs one handler at a time.
#[derive(Debug)]
pub enum Event {
    MapClick(GeoPoint),
    Pause,
    Resume,
    Reset,
    Tick(ClockId),
    RouteResolved {
        request: RequestId,
        result: Result<RouteResult, RouteError>,
    },
    Shutdown,
}
