use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::{DerivedReading, ExtremeOrder, Period};
use crate::sensing::CollectorPhase;
use crate::settings::SensorMode;
use crate::volume::TankGeometry;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// A stored reading as served over HTTP, volume and fill rounded to 0.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingResponse {
    pub distance_cm: f64,
    pub sensor_timestamp: String,
    pub sensor_ip: String,
    pub fetched_at_epoch: i64,
    pub volume_liters: f64,
    pub fill_percent: f64,
    pub out_of_range: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<i64>,
}

impl ReadingResponse {
    pub fn with_age(mut self, age_seconds: i64) -> Self {
        self.age_seconds = Some(age_seconds);
        self
    }
}

impl From<DerivedReading> for ReadingResponse {
    fn from(derived: DerivedReading) -> Self {
        let DerivedReading { reading, estimate } = derived;
        Self {
            distance_cm: reading.distance_cm,
            sensor_timestamp: reading.sensor_timestamp,
            sensor_ip: reading.sensor_ip,
            fetched_at_epoch: reading.fetched_at_epoch,
            volume_liters: round1(estimate.volume_liters),
            fill_percent: round1(estimate.fill_percent),
            out_of_range: estimate.out_of_range,
            age_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastResponse {
    pub has_data: bool,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<ReadingResponse>,
}

impl LastResponse {
    pub fn empty() -> Self {
        Self {
            has_data: false,
            reading: None,
        }
    }

    pub fn present(reading: ReadingResponse) -> Self {
        Self {
            has_data: true,
            reading: Some(reading),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtremesResponse {
    pub period: Period,
    pub order: ExtremeOrder,
    pub count: usize,
    pub items: Vec<ReadingResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mode: SensorMode,
    pub db_path: String,
    pub collect_interval_seconds: u64,
    pub has_data: bool,
    pub last_fetch_ok: Option<bool>,
    pub seconds_since_last_success: Option<i64>,
    pub collector_phase: CollectorPhase,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TankResponse {
    pub total_liters: f64,
    pub diameter_cm: f64,
    pub length_cm: f64,
    pub full_air_gap_cm: f64,
}

impl From<&TankGeometry> for TankResponse {
    fn from(geometry: &TankGeometry) -> Self {
        Self {
            total_liters: geometry.total_liters(),
            diameter_cm: geometry.diameter_cm(),
            length_cm: geometry.length_cm(),
            full_air_gap_cm: geometry.full_air_gap_cm(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodExtremes {
    pub max: Vec<ReadingResponse>,
    pub min: Vec<ReadingResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub tank: TankResponse,
    pub mode: SensorMode,
    pub has_data: bool,
    pub last: Option<ReadingResponse>,
    pub extremes: BTreeMap<&'static str, PeriodExtremes>,
}
