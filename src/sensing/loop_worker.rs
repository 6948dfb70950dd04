use std::sync::Arc;

use chrono::Utc;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{CollectorPhase, CollectorStatus, SensorSource};
use crate::db::{Database, DerivedReading, Reading};
use crate::volume::TankGeometry;

// Set to false to silence per-cycle logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Upper bound on one whole cycle (fetch + insert). The live sensor's HTTP
/// timeout must stay below it.
pub const CYCLE_TIMEOUT_SECS: u64 = 30;

/// How a single collection cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Stored(DerivedReading),
    /// The sensor reported a timestamp that is already stored.
    Duplicate(DerivedReading),
    SensorUnavailable(String),
    StorageFailed(String),
}

/// One fetch → convert → persist pass, with no state carried between passes.
#[derive(Clone)]
pub struct Collector {
    sensor: Arc<dyn SensorSource>,
    db: Database,
    geometry: TankGeometry,
    status: CollectorStatus,
}

impl Collector {
    pub fn new(
        sensor: Arc<dyn SensorSource>,
        db: Database,
        geometry: TankGeometry,
        status: CollectorStatus,
    ) -> Self {
        Self {
            sensor,
            db,
            geometry,
            status,
        }
    }

    pub async fn run_cycle(&self) -> CycleOutcome {
        let cycle_start = Instant::now();
        self.status.begin_cycle().await;

        let sample = match self.sensor.fetch().await {
            Ok(sample) => sample,
            Err(err) => {
                log_warn!("{} sensor unavailable, skipping cycle: {err}", self.sensor.name());
                self.status.record_sensor_failure(err.to_string()).await;
                return CycleOutcome::SensorUnavailable(err.to_string());
            }
        };

        let fetched_at_epoch = Utc::now().timestamp();
        self.status.record_fetch(fetched_at_epoch).await;

        let derived = Reading {
            distance_cm: sample.distance_cm,
            sensor_timestamp: sample.sensor_timestamp,
            sensor_ip: sample.sensor_ip,
            fetched_at_epoch,
        }
        .derive(&self.geometry);

        if derived.estimate.out_of_range {
            log_warn!(
                "distance {:.1}cm is outside the tank ({:.1}..={:.1}cm), volume pinned at {:.1}L",
                derived.reading.distance_cm,
                self.geometry.full_air_gap_cm(),
                self.geometry.empty_distance_cm(),
                derived.volume_liters()
            );
        }

        self.status.set_phase(CollectorPhase::Persisting).await;
        match self.db.append_reading(&derived.reading).await {
            Ok(inserted) => {
                self.status.record_persisted(inserted).await;
                let elapsed_ms = cycle_start.elapsed().as_millis();
                if inserted {
                    log_info!(
                        "stored reading {} distance={:.1}cm volume={:.1}L fill={:.1}% ({}ms)",
                        derived.reading.sensor_timestamp,
                        derived.reading.distance_cm,
                        derived.volume_liters(),
                        derived.fill_percent(),
                        elapsed_ms
                    );
                    CycleOutcome::Stored(derived)
                } else {
                    log_debug!(
                        "sensor timestamp {} already stored, nothing new ({}ms)",
                        derived.reading.sensor_timestamp,
                        elapsed_ms
                    );
                    CycleOutcome::Duplicate(derived)
                }
            }
            Err(err) => {
                log_error!(
                    "failed to persist reading {}: {err}",
                    derived.reading.sensor_timestamp
                );
                self.status.record_storage_failure(err.to_string()).await;
                CycleOutcome::StorageFailed(err.to_string())
            }
        }
    }

    /// Charges an abandoned cycle to whichever side it was waiting on. An
    /// insert already handed to the storage worker may still land.
    async fn record_timeout(&self) {
        let message = format!("cycle exceeded {CYCLE_TIMEOUT_SECS}s");
        match self.status.snapshot().await.phase {
            CollectorPhase::Persisting => {
                log_error!("collection cycle timed out waiting on storage (> {CYCLE_TIMEOUT_SECS}s)");
                self.status.record_storage_failure(message).await;
            }
            _ => {
                log_warn!("collection cycle timed out waiting on the sensor (> {CYCLE_TIMEOUT_SECS}s)");
                self.status.record_sensor_failure(message).await;
            }
        }
    }
}

/// Runs one cycle immediately, then one per `interval` until cancelled.
///
/// Cycles never overlap: a slow cycle delays the next tick instead of
/// stacking another fetch behind it.
pub async fn collection_loop(
    collector: Collector,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!(
        "collector started with {} sensor, interval {}s",
        collector.sensor.name(),
        interval.as_secs()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let cycle = tokio::time::timeout(
                    Duration::from_secs(CYCLE_TIMEOUT_SECS),
                    collector.run_cycle(),
                );

                tokio::select! {
                    result = cycle => {
                        if result.is_err() {
                            collector.record_timeout().await;
                        }
                    }
                    _ = cancel_token.cancelled() => {
                        log_info!("collector cancelled mid-cycle");
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("collector shutting down");
                break;
            }
        }
    }

    collector.status.set_phase(CollectorPhase::Idle).await;
}
