use std::path::PathBuf;

use route_sim_lib::path_metrics::MetricsError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("No route found between the two points")]
    NotFound,
    #[error("Route was found but its path is empty")]
    EmptyPath,
    #[error("Routing request failed: {0}")]
    Transport(String),
    #[error("Routing service answered {code}: {message}")]
    Service { code: String, message: String },
    #[error("Invalid routing response: {0}")]
    InvalidResponse(String),
    #[error("Invalid route metrics: {0}")]
    InvalidMetrics(MetricsError),
}

impl RouteError {
    /// Errors after which retrying the same two points is pointless.
    pub fn is_no_route(&self) -> bool {
        matches!(self, RouteError::NotFound | RouteError::EmptyPath)
    }
}

impl From<MetricsError> for RouteError {
    fn from(err: MetricsError) -> Self {
        match err {
            MetricsError::EmptyPath => RouteError::EmptyPath,
            other => RouteError::InvalidMetrics(other),
        }
    }
}

impl From<reqwest::Error> for RouteError {
    fn from(err: reqwest::Error) -> Self {
        RouteError::Transport(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Line {line}: expected `key = value`")]
    Syntax { line: usize },
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}
