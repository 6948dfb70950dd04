use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

/// Where the collector currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollectorPhase {
    #[default]
    Idle,
    Fetching,
    Converting,
    Persisting,
    /// The last fetch failed; waiting for the next tick.
    Backoff,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    pub phase: CollectorPhase,
    /// `None` until the first fetch completes.
    pub last_fetch_ok: Option<bool>,
    pub last_success_epoch: Option<i64>,
    pub last_error: Option<String>,
    pub cycles: u64,
    pub stored: u64,
    pub duplicates: u64,
    pub sensor_failures: u64,
    pub storage_failures: u64,
}

impl StatusSnapshot {
    pub fn seconds_since_success(&self, now_epoch: i64) -> Option<i64> {
        self.last_success_epoch.map(|epoch| now_epoch - epoch)
    }
}

/// Collector progress shared between the loop and the query layer.
#[derive(Clone, Default)]
pub struct CollectorStatus {
    inner: Arc<Mutex<StatusSnapshot>>,
}

impl CollectorStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.inner.lock().await.clone()
    }

    pub async fn set_phase(&self, phase: CollectorPhase) {
        self.inner.lock().await.phase = phase;
    }

    pub async fn begin_cycle(&self) {
        let mut state = self.inner.lock().await;
        state.cycles += 1;
        state.phase = CollectorPhase::Fetching;
    }

    pub async fn record_sensor_failure(&self, error: String) {
        let mut state = self.inner.lock().await;
        state.sensor_failures += 1;
        state.last_fetch_ok = Some(false);
        state.last_error = Some(error);
        state.phase = CollectorPhase::Backoff;
    }

    pub async fn record_fetch(&self, fetched_at_epoch: i64) {
        let mut state = self.inner.lock().await;
        state.last_fetch_ok = Some(true);
        state.last_success_epoch = Some(fetched_at_epoch);
        state.phase = CollectorPhase::Converting;
    }

    pub async fn record_persisted(&self, inserted: bool) {
        let mut state = self.inner.lock().await;
        if inserted {
            state.stored += 1;
        } else {
            state.duplicates += 1;
        }
        state.phase = CollectorPhase::Idle;
    }

    pub async fn record_storage_failure(&self, error: String) {
        let mut state = self.inner.lock().await;
        state.storage_failures += 1;
        state.last_error = Some(error);
        state.phase = CollectorPhase::Idle;
    }
}
