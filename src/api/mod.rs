//! HTTP query layer over the readings store.

mod responses;

pub use responses::{
    DashboardResponse, ExtremesResponse, HealthResponse, LastResponse, ReadingResponse,
};

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::db::{Database, ExtremeOrder, Period};
use crate::error::StorageFailure;
use crate::sensing::CollectorStatus;
use crate::settings::Config;
use crate::volume::TankGeometry;

use responses::{PeriodExtremes, TankResponse};

/// Largest `n` accepted by list endpoints.
pub const MAX_ITEMS: usize = 50;
const DEFAULT_EXTREMES: usize = 5;
const DEFAULT_RECENT: usize = 20;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub status: CollectorStatus,
}

type ApiError = (StatusCode, String);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn storage_error(err: StorageFailure) -> ApiError {
    log::error!("query failed: {err}");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn check_count(n: usize) -> Result<usize, ApiError> {
    if (1..=MAX_ITEMS).contains(&n) {
        Ok(n)
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            format!("n must be between 1 and {MAX_ITEMS}, got {n}"),
        ))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/last", get(last))
        .route("/api/current", get(last))
        .route("/api/extremes", get(extremes))
        .route("/api/recent", get(recent))
        .route("/api/dashboard", get(dashboard))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    let last = state.db.last_reading().await.map_err(storage_error)?;
    let status = state.status.snapshot().await;
    let now = Utc::now().timestamp();

    Ok(Json(HealthResponse {
        status: "ok",
        mode: state.config.mode,
        db_path: state.db.path().display().to_string(),
        collect_interval_seconds: state.config.collect_interval.as_secs(),
        has_data: last.is_some(),
        last_fetch_ok: status.last_fetch_ok,
        seconds_since_last_success: status.seconds_since_success(now),
        collector_phase: status.phase,
        last_error: status.last_error,
    }))
}

async fn last(State(state): State<AppState>) -> ApiResult<LastResponse> {
    let last = state.db.last_reading().await.map_err(storage_error)?;
    let now = Utc::now().timestamp();

    Ok(Json(match last {
        Some(reading) => {
            let age = reading.age_seconds(now);
            LastResponse::present(
                ReadingResponse::from(reading.derive(&state.config.geometry)).with_age(age),
            )
        }
        None => LastResponse::empty(),
    }))
}

#[derive(Debug, Deserialize)]
struct ExtremesParams {
    period: Option<Period>,
    order: Option<ExtremeOrder>,
    n: Option<usize>,
}

async fn extremes(
    State(state): State<AppState>,
    Query(params): Query<ExtremesParams>,
) -> ApiResult<ExtremesResponse> {
    let period = params.period.unwrap_or(Period::Day);
    let order = params.order.unwrap_or(ExtremeOrder::Max);
    let n = check_count(params.n.unwrap_or(DEFAULT_EXTREMES))?;

    let items: Vec<ReadingResponse> = state
        .db
        .extremes(&state.config.geometry, period, order, n)
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(ReadingResponse::from)
        .collect();

    Ok(Json(ExtremesResponse {
        period,
        order,
        count: items.len(),
        items,
    }))
}

#[derive(Debug, Deserialize)]
struct CountParams {
    n: Option<usize>,
}

async fn recent(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> ApiResult<Vec<ReadingResponse>> {
    let n = check_count(params.n.unwrap_or(DEFAULT_RECENT))?;
    let geometry = state.config.geometry;

    let items = state
        .db
        .recent_readings(n)
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(|reading| ReadingResponse::from(reading.derive(&geometry)))
        .collect();

    Ok(Json(items))
}

async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> ApiResult<DashboardResponse> {
    let n = check_count(params.n.unwrap_or(DEFAULT_EXTREMES))?;
    let geometry = state.config.geometry;
    let now = Utc::now().timestamp();

    let last = state
        .db
        .last_reading()
        .await
        .map_err(storage_error)?
        .map(|reading| {
            let age = reading.age_seconds(now);
            ReadingResponse::from(reading.derive(&geometry)).with_age(age)
        });

    let mut extremes = BTreeMap::new();
    for period in Period::ALL_PERIODS {
        let max = extreme_items(&state.db, &geometry, period, ExtremeOrder::Max, n, now)
            .await
            .map_err(storage_error)?;
        let min = extreme_items(&state.db, &geometry, period, ExtremeOrder::Min, n, now)
            .await
            .map_err(storage_error)?;
        extremes.insert(period.as_str(), PeriodExtremes { max, min });
    }

    Ok(Json(DashboardResponse {
        tank: TankResponse::from(&geometry),
        mode: state.config.mode,
        has_data: last.is_some(),
        last,
        extremes,
    }))
}

async fn extreme_items(
    db: &Database,
    geometry: &TankGeometry,
    period: Period,
    order: ExtremeOrder,
    n: usize,
    now_epoch: i64,
) -> Result<Vec<ReadingResponse>, StorageFailure> {
    let rows = db.extremes_at(geometry, period, order, n, now_epoch).await?;
    Ok(rows.into_iter().map(ReadingResponse::from).collect())
}
