//! Water-level reading data model.
//!
//! A `Reading` is what the collector persists: the raw sensor distance plus
//! where and when it was observed. Volume and fill level are never stored;
//! `DerivedReading` recomputes them from the current tank geometry.

use serde::{Deserialize, Serialize};

use crate::volume::{self, TankGeometry, VolumeEstimate};

/// A single sensor sample. Immutable once stored; `sensor_timestamp` is unique
/// across the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub distance_cm: f64,
    pub sensor_timestamp: String,
    pub sensor_ip: String,
    pub fetched_at_epoch: i64,
}

impl Reading {
    pub fn age_seconds(&self, now_epoch: i64) -> i64 {
        now_epoch - self.fetched_at_epoch
    }

    pub fn derive(self, geometry: &TankGeometry) -> DerivedReading {
        let estimate = volume::convert(self.distance_cm, geometry);
        DerivedReading {
            reading: self,
            estimate,
        }
    }
}

/// A stored reading paired with the volume it represents under the current
/// geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedReading {
    #[serde(flatten)]
    pub reading: Reading,
    #[serde(flatten)]
    pub estimate: VolumeEstimate,
}

impl DerivedReading {
    pub fn volume_liters(&self) -> f64 {
        self.estimate.volume_liters
    }

    pub fn fill_percent(&self) -> f64 {
        self.estimate.fill_percent
    }
}
