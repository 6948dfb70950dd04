#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use cuve_lib::db::{Database, Reading};
use cuve_lib::error::SensorUnavailable;
use cuve_lib::sensing::{RawSample, SensorSource};
use cuve_lib::volume::TankGeometry;
use tempfile::TempDir;

pub fn reference_tank() -> TankGeometry {
    TankGeometry::new(10_000.0, 184.5, 436.4, 20.0).expect("valid geometry")
}

/// Opens a fresh database in a temporary directory. Keep the `TempDir`
/// alive for as long as the database is used.
pub fn temp_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = Database::new(dir.path().join("cuve.sqlite3")).expect("open database");
    (dir, db)
}

pub fn reading(sensor_timestamp: &str, distance_cm: f64, fetched_at_epoch: i64) -> Reading {
    Reading {
        distance_cm,
        sensor_timestamp: sensor_timestamp.to_string(),
        sensor_ip: "10.0.0.4".to_string(),
        fetched_at_epoch,
    }
}

/// Sensor that keeps reporting the same sample, like a device whose reading
/// has not refreshed since the last poll.
pub struct StuckSensor {
    pub sample: RawSample,
    pub calls: AtomicUsize,
}

impl StuckSensor {
    pub fn new(sensor_timestamp: &str, distance_cm: f64) -> Arc<Self> {
        Arc::new(Self {
            sample: RawSample {
                distance_cm,
                sensor_timestamp: sensor_timestamp.to_string(),
                sensor_ip: "10.0.0.4".to_string(),
            },
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SensorSource for StuckSensor {
    fn name(&self) -> &'static str {
        "stuck"
    }

    async fn fetch(&self) -> Result<RawSample, SensorUnavailable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.sample.clone())
    }
}

/// Sensor that is never reachable.
#[derive(Default)]
pub struct DeadSensor {
    pub calls: AtomicUsize,
}

impl DeadSensor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SensorSource for DeadSensor {
    fn name(&self) -> &'static str {
        "dead"
    }

    async fn fetch(&self) -> Result<RawSample, SensorUnavailable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SensorUnavailable::Connection("connection refused".into()))
    }
}
