use std::sync::Arc;

use async_trait::async_trait;
use route_sim_lib::{geo_point::GeoPoint, route::RouteResult};

use crate::{
    config::{RouterKind, SimConfig},
    error::RouteError,
};

mod osrm;
mod straight_line;

pub use osrm::OsrmRouter;
pub use straight_line::StraightLineRouter;

/// A service that turns two endpoints into a road-following route.
#[async_trait]
pub trait Router: Send + Sync {
    async fn request_route(&self, from: GeoPoint, to: GeoPoint) -> Result<RouteResult, RouteError>;
}

pub fn build_router(config: &SimConfig) -> Result<Arc<dyn Router>, RouteError> {
    Ok(match config.router {
        RouterKind::Osrm => Arc::new(OsrmRouter::new(&config.osrm)?),
        RouterKind::StraightLine => Arc::new(StraightLineRouter::new(&config.straight_line)),
    })
}
