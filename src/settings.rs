use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use log::warn;
use serde::Serialize;

use crate::error::ConfigError;
use crate::sensing::CYCLE_TIMEOUT_SECS;
use crate::volume::TankGeometry;

/// Shortest collection interval accepted; anything lower is raised to this.
pub const MIN_COLLECT_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorMode {
    /// Poll the physical sensor over HTTP.
    Real,
    /// Generate plausible readings locally.
    Sim,
}

impl SensorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorMode::Real => "real",
            SensorMode::Sim => "sim",
        }
    }
}

/// Raw settings from command-line flags or `CUVE_*` environment variables.
#[derive(Debug, Clone, Parser)]
#[command(name = "cuve", version, about = "Water tank level collector and query service")]
pub struct Settings {
    #[arg(long, env = "CUVE_MODE", value_enum, default_value_t = SensorMode::Real)]
    pub mode: SensorMode,

    /// Sensor endpoint, required in real mode.
    #[arg(long, env = "CUVE_SENSOR_URL")]
    pub sensor_url: Option<String>,

    #[arg(long, env = "CUVE_HTTP_TIMEOUT_SECONDS", default_value_t = 2.0)]
    pub http_timeout_seconds: f64,

    #[arg(long, env = "CUVE_DB_PATH", default_value = "cuve.sqlite3")]
    pub db_path: PathBuf,

    #[arg(long, env = "CUVE_COLLECT_INTERVAL_SECONDS", default_value_t = 60)]
    pub collect_interval_seconds: u64,

    #[arg(long, env = "CUVE_TANK_TOTAL_LITERS", default_value_t = 10_000.0)]
    pub tank_total_liters: f64,

    #[arg(long, env = "CUVE_TANK_DIAMETER_CM", default_value_t = 184.5)]
    pub tank_diameter_cm: f64,

    #[arg(long, env = "CUVE_TANK_LENGTH_CM", default_value_t = 436.4)]
    pub tank_length_cm: f64,

    #[arg(long, env = "CUVE_TANK_FULL_AIR_GAP_CM", default_value_t = 20.0)]
    pub tank_full_air_gap_cm: f64,

    #[arg(long, env = "CUVE_LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: SocketAddr,
}

/// Which sensor the collector polls, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorConfig {
    Live { url: String, timeout: Duration },
    Synthetic,
}

/// Validated, immutable process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: SensorMode,
    pub sensor: SensorConfig,
    pub db_path: PathBuf,
    pub collect_interval: Duration,
    pub geometry: TankGeometry,
    pub listen_addr: SocketAddr,
}

impl Settings {
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let geometry = TankGeometry::new(
            self.tank_total_liters,
            self.tank_diameter_cm,
            self.tank_length_cm,
            self.tank_full_air_gap_cm,
        )?;

        let sensor = match self.mode {
            SensorMode::Sim => SensorConfig::Synthetic,
            SensorMode::Real => {
                let url = self
                    .sensor_url
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty())
                    .ok_or(ConfigError::MissingSensorUrl)?;
                // The HTTP client is built without a TLS backend.
                if !url.starts_with("http://") {
                    return Err(ConfigError::InvalidSensorUrl {
                        url,
                        reason: "expected an http:// URL".into(),
                    });
                }
                if !(self.http_timeout_seconds.is_finite() && self.http_timeout_seconds > 0.0) {
                    return Err(ConfigError::InvalidTimeout(self.http_timeout_seconds));
                }
                if self.http_timeout_seconds >= CYCLE_TIMEOUT_SECS as f64 {
                    return Err(ConfigError::TimeoutExceedsCycle {
                        timeout: self.http_timeout_seconds,
                        cycle: CYCLE_TIMEOUT_SECS,
                    });
                }
                SensorConfig::Live {
                    url,
                    timeout: Duration::from_secs_f64(self.http_timeout_seconds),
                }
            }
        };

        let interval_secs = if self.collect_interval_seconds < MIN_COLLECT_INTERVAL_SECS {
            warn!(
                "collect interval {}s is below the {}s minimum, using {}s",
                self.collect_interval_seconds, MIN_COLLECT_INTERVAL_SECS, MIN_COLLECT_INTERVAL_SECS
            );
            MIN_COLLECT_INTERVAL_SECS
        } else {
            self.collect_interval_seconds
        };

        Ok(Config {
            mode: self.mode,
            sensor,
            db_path: self.db_path,
            collect_interval: Duration::from_secs(interval_secs),
            geometry,
            listen_addr: self.listen_addr,
        })
    }
}
