pub mod api;
pub mod db;
pub mod error;
pub mod probe;
pub mod sensing;
pub mod settings;
pub mod utils;
pub mod volume;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use api::{build_router, AppState};
use db::Database;
use sensing::{
    Collector, CollectorController, CollectorStatus, LiveSensor, SensorSource, SyntheticSensor,
};
use settings::{Config, SensorConfig, Settings};

/// Builds the sensor selected by the configuration.
pub fn build_sensor(config: &Config) -> Result<Arc<dyn SensorSource>> {
    let sensor: Arc<dyn SensorSource> = match &config.sensor {
        SensorConfig::Live { url, timeout } => {
            info!("Polling sensor at {url} (timeout {timeout:?})");
            Arc::new(LiveSensor::new(url.clone(), *timeout)?)
        }
        SensorConfig::Synthetic => {
            info!("Simulated sensor mode");
            Arc::new(SyntheticSensor::new(&config.geometry))
        }
    };
    Ok(sensor)
}

pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Arc::new(
        Settings::parse()
            .into_config()
            .context("invalid configuration")?,
    );

    info!("Cuve starting up in {} mode...", config.mode.as_str());

    let database = Database::new(config.db_path.clone())?;
    let status = CollectorStatus::new();
    let sensor = build_sensor(&config)?;

    let mut controller = CollectorController::new();
    controller.start(
        Collector::new(sensor, database.clone(), config.geometry, status.clone()),
        config.collect_interval,
    )?;

    let app = build_router(AppState {
        db: database,
        config: Arc::clone(&config),
        status,
    });

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed");

    controller.stop().await?;
    info!("Cuve stopped");

    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
