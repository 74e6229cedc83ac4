use std::{path::Path, str::FromStr, time::Duration};

use crate::error::ConfigError;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(120);
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_OSRM_PROFILE: &str = "driving";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterKind {
    Osrm,
    StraightLine,
}

impl FromStr for RouterKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "osrm" => Ok(RouterKind::Osrm),
            "straight_line" | "offline" => Ok(RouterKind::StraightLine),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StraightLineConfig {
    pub speed_kmh: f64,
    pub segments: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub tick_period: Duration,
    pub router: RouterKind,
    pub osrm: OsrmConfig,
    pub straight_line: StraightLineConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            router: RouterKind::Osrm,
            osrm: OsrmConfig {
                base_url: DEFAULT_OSRM_URL.into(),
                profile: DEFAULT_OSRM_PROFILE.into(),
                timeout: Duration::from_secs(10),
            },
            straight_line: StraightLineConfig {
                speed_kmh: 50.,
                segments: 100,
            },
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::default().apply(&text)
    }

    /// Applies `key = value` lines on top of `self`. Blank lines and `#` comments
    /// are skipped, unknown keys are logged and ignored.
    pub fn apply(mut self, text: &str) -> Result<Self, ConfigError> {
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Syntax { line: i + 1 });
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "tick_ms" => self.tick_period = Duration::from_millis(parse(key, value)?),
                "router" => {
                    self.router = value.parse().map_err(|_| invalid(key, value))?;
                }
                "osrm_url" => self.osrm.base_url = value.to_string(),
                "osrm_profile" => self.osrm.profile = value.to_string(),
                "timeout_s" => {
                    let secs: f64 = parse(key, value)?;
                    if !secs.is_finite() || secs <= 0. {
                        return Err(invalid(key, value));
                    }
                    self.osrm.timeout = Duration::from_secs_f64(secs);
                }
                "offline_speed_kmh" => self.straight_line.speed_kmh = parse(key, value)?,
                "offline_segments" => self.straight_line.segments = parse(key, value)?,
                _ => {
                    tracing::warn!("Unknown config key: {}", key);
                }
            }
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period.is_zero() {
            return Err(invalid("tick_ms", "0"));
        }
        if self.osrm.base_url.is_empty() {
            return Err(invalid("osrm_url", ""));
        }
        if self.osrm.timeout.is_zero() {
            return Err(invalid("timeout_s", "0"));
        }
        let speed = self.straight_line.speed_kmh;
        if !speed.is_finite() || speed <= 0. {
            return Err(invalid("offline_speed_kmh", &speed.to_string()));
        }
        if self.straight_line.segments == 0 {
            return Err(invalid("offline_segments", "0"));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
