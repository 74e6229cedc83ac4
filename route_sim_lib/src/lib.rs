pub mod geo_point;
pub mod path_metrics;
pub mod route;
pub mod util;
