//! Sensor sources and the background collector that polls them.

pub mod controller;
pub mod live;
pub mod loop_worker;
pub mod status;
pub mod synthetic;

pub use controller::CollectorController;
pub use live::LiveSensor;
pub use loop_worker::{collection_loop, Collector, CycleOutcome, CYCLE_TIMEOUT_SECS};
pub use status::{CollectorPhase, CollectorStatus, StatusSnapshot};
pub use synthetic::SyntheticSensor;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::SensorUnavailable;

/// One raw sample as reported by the sensor device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawSample {
    pub distance_cm: f64,
    /// Device-side timestamp; the store's dedup key.
    pub sensor_timestamp: String,
    pub sensor_ip: String,
}

/// Anything that can produce a distance reading on demand.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Short label for logs and the health endpoint.
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<RawSample, SensorUnavailable>;
}
