use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use super::loop_worker::{collection_loop, Collector};

/// Owns the background collection task.
pub struct CollectorController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for CollectorController {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn start(&mut self, collector: Collector, interval: Duration) -> Result<()> {
        if self.handle.is_some() {
            bail!("collector already running");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(collection_loop(collector, interval, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            info!("Stopping collector");
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("collector task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
