//! Error taxonomy shared by the sensor, storage and configuration layers.

use std::time::Duration;

use thiserror::Error;

/// A sensor fetch that produced no usable sample. Always transient: the
/// collector skips the cycle and retries on the next tick.
#[derive(Debug, Error)]
pub enum SensorUnavailable {
    #[error("sensor did not answer within {0:?}")]
    Timeout(Duration),
    #[error("sensor unreachable: {0}")]
    Connection(String),
    #[error("sensor answered with HTTP {0}")]
    Status(u16),
    #[error("malformed sensor payload: {0}")]
    Malformed(String),
    #[error("sensor request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for SensorUnavailable {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            SensorUnavailable::Status(status.as_u16())
        } else if err.is_connect() {
            SensorUnavailable::Connection(err.to_string())
        } else if err.is_decode() || err.is_body() {
            SensorUnavailable::Malformed(err.to_string())
        } else {
            SensorUnavailable::Request(err.to_string())
        }
    }
}

/// Storage-layer I/O or schema failure. Fatal to the operation that hit it.
#[derive(Debug, Error)]
#[error("storage failure: {0:#}")]
pub struct StorageFailure(pub anyhow::Error);

impl From<anyhow::Error> for StorageFailure {
    fn from(err: anyhow::Error) -> Self {
        StorageFailure(err)
    }
}

pub type StorageResult<T> = Result<T, StorageFailure>;

/// Tank dimensions that cannot describe a horizontal cylinder.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidGeometry {
    #[error("tank total volume must be a positive number of liters, got {0}")]
    TotalLiters(f64),
    #[error("tank diameter must be a positive number of cm, got {0}")]
    Diameter(f64),
    #[error("tank length must be a positive number of cm, got {0}")]
    Length(f64),
    #[error("full-tank air gap must be a non-negative number of cm, got {0}")]
    FullAirGap(f64),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CUVE_SENSOR_URL is required when CUVE_MODE=real")]
    MissingSensorUrl,
    #[error("sensor URL '{url}' is invalid: {reason}")]
    InvalidSensorUrl { url: String, reason: String },
    #[error("HTTP timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),
    #[error("HTTP timeout of {timeout}s must be shorter than the {cycle}s collection cycle limit")]
    TimeoutExceedsCycle { timeout: f64, cycle: u64 },
    #[error(transparent)]
    Geometry(#[from] InvalidGeometry),
}
