use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{RawSample, SensorSource};
use crate::error::SensorUnavailable;
use crate::volume::TankGeometry;

/// Offset from the full-tank air gap where the simulated level starts.
const START_OFFSET_CM: f64 = 10.0;
const DRIFT_STEPS: [f64; 5] = [-1.0, 0.0, 0.0, 0.0, 1.0];
const NOISE_CM: i32 = 2;

struct WalkState {
    rng: StdRng,
    distance_cm: f64,
    last_timestamp_ms: i64,
}

/// Stand-in for the physical sensor: a slow random walk of the distance,
/// bounded by the tank, stamped with the current time.
pub struct SyntheticSensor {
    min_distance_cm: f64,
    max_distance_cm: f64,
    state: Mutex<WalkState>,
}

impl SyntheticSensor {
    pub fn new(geometry: &TankGeometry) -> Self {
        Self::with_rng(geometry, StdRng::from_entropy())
    }

    pub fn seeded(geometry: &TankGeometry, seed: u64) -> Self {
        Self::with_rng(geometry, StdRng::seed_from_u64(seed))
    }

    fn with_rng(geometry: &TankGeometry, rng: StdRng) -> Self {
        let min_distance_cm = geometry.full_air_gap_cm();
        let max_distance_cm = geometry.empty_distance_cm();
        let start = (min_distance_cm + START_OFFSET_CM).clamp(min_distance_cm, max_distance_cm);

        Self {
            min_distance_cm,
            max_distance_cm,
            state: Mutex::new(WalkState {
                rng,
                distance_cm: start,
                last_timestamp_ms: i64::MIN,
            }),
        }
    }

    fn next_sample(&self, now: DateTime<Utc>) -> RawSample {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let drift = DRIFT_STEPS[state.rng.gen_range(0..DRIFT_STEPS.len())];
        let noise = f64::from(state.rng.gen_range(-NOISE_CM..=NOISE_CM));
        state.distance_cm =
            (state.distance_cm + drift + noise).clamp(self.min_distance_cm, self.max_distance_cm);

        // Two fetches within the same millisecond still get distinct keys.
        let timestamp_ms = now
            .timestamp_millis()
            .max(state.last_timestamp_ms.saturating_add(1));
        state.last_timestamp_ms = timestamp_ms;

        let sensor_timestamp = DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
            .unwrap_or(now)
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        RawSample {
            distance_cm: state.distance_cm,
            sensor_timestamp,
            sensor_ip: "simulated".to_string(),
        }
    }
}

#[async_trait]
impl SensorSource for SyntheticSensor {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch(&self) -> Result<RawSample, SensorUnavailable> {
        Ok(self.next_sample(Utc::now()))
    }
}
