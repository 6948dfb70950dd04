use anyhow::Context;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::{
    connection::Database,
    helpers::{collect_readings, reading_from_row, to_i64, READING_COLUMNS},
    models::{DerivedReading, ExtremeOrder, Period, Reading},
};
use crate::error::{StorageFailure, StorageResult};
use crate::volume::TankGeometry;

/// Newest fetch first. Equal fetch times fall back to the larger sensor
/// timestamp, compared as a number when it is all digits, then to insertion
/// order.
const NEWEST_FIRST: &str = "fetched_at_epoch DESC,
    CASE WHEN sensor_timestamp <> '' AND sensor_timestamp NOT GLOB '*[^0-9]*'
         THEN CAST(sensor_timestamp AS INTEGER) END DESC,
    sensor_timestamp DESC,
    id DESC";

impl Database {
    /// Stores a reading unless one with the same sensor timestamp exists.
    /// Returns whether a row was written.
    pub async fn append_reading(&self, reading: &Reading) -> StorageResult<bool> {
        let record = reading.clone();
        self.execute(move |conn| {
            let changed = conn
                .execute(
                    "INSERT INTO readings (distance_cm, sensor_timestamp, sensor_ip, fetched_at_epoch)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(sensor_timestamp) DO NOTHING",
                    params![
                        record.distance_cm,
                        record.sensor_timestamp,
                        record.sensor_ip,
                        record.fetched_at_epoch,
                    ],
                )
                .with_context(|| {
                    format!("failed to insert reading {}", record.sensor_timestamp)
                })?;
            Ok(changed == 1)
        })
        .await
        .map_err(StorageFailure::from)
    }

    /// Most recently fetched reading, ordered by `NEWEST_FIRST`.
    pub async fn last_reading(&self) -> StorageResult<Option<Reading>> {
        self.execute(|conn| {
            let sql = format!(
                "SELECT {READING_COLUMNS}
                 FROM readings
                 ORDER BY {NEWEST_FIRST}
                 LIMIT 1"
            );
            let reading = conn
                .query_row(&sql, [], reading_from_row)
                .optional()
                .context("failed to load last reading")?;
            Ok(reading)
        })
        .await
        .map_err(StorageFailure::from)
    }

    /// The `n` most recently fetched readings, newest first.
    pub async fn recent_readings(&self, n: usize) -> StorageResult<Vec<Reading>> {
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {READING_COLUMNS}
                 FROM readings
                 ORDER BY {NEWEST_FIRST}
                 LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![to_i64(n)?], reading_from_row)?;
            collect_readings(rows)
        })
        .await
        .map_err(StorageFailure::from)
    }

    pub async fn count_readings(&self) -> StorageResult<u64> {
        self.execute(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))
                .context("failed to count readings")?;
            Ok(count.max(0) as u64)
        })
        .await
        .map_err(StorageFailure::from)
    }

    pub async fn extremes(
        &self,
        geometry: &TankGeometry,
        period: Period,
        order: ExtremeOrder,
        n: usize,
    ) -> StorageResult<Vec<DerivedReading>> {
        self.extremes_at(geometry, period, order, n, Utc::now().timestamp())
            .await
    }

    /// The `n` readings with the smallest or largest volume whose
    /// `fetched_at_epoch` lies in `period` ending at `now_epoch` (both ends
    /// inclusive). Ties go to the earliest fetch.
    ///
    /// Volume is a non-decreasing function of the clamped water depth, so the
    /// ranking runs in SQL on `clamp(empty_distance - distance_cm, 0, diameter)`
    /// and only the selected rows are converted.
    pub async fn extremes_at(
        &self,
        geometry: &TankGeometry,
        period: Period,
        order: ExtremeOrder,
        n: usize,
        now_epoch: i64,
    ) -> StorageResult<Vec<DerivedReading>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let empty_distance = geometry.empty_distance_cm();
        let diameter = geometry.diameter_cm();
        let bounds = period.bounds(now_epoch);
        let direction = match order {
            ExtremeOrder::Min => "ASC",
            ExtremeOrder::Max => "DESC",
        };

        let readings = self
            .execute(move |conn| {
                let filter = if bounds.is_some() {
                    "WHERE fetched_at_epoch BETWEEN ?4 AND ?5"
                } else {
                    ""
                };
                let sql = format!(
                    "SELECT {READING_COLUMNS}
                     FROM readings
                     {filter}
                     ORDER BY MIN(MAX(?1 - distance_cm, 0.0), ?2) {direction},
                              fetched_at_epoch ASC,
                              id ASC
                     LIMIT ?3"
                );
                let mut stmt = conn.prepare(&sql)?;
                let limit = to_i64(n)?;
                let rows = match bounds {
                    Some((since, until)) => stmt.query_map(
                        params![empty_distance, diameter, limit, since, until],
                        reading_from_row,
                    )?,
                    None => stmt.query_map(
                        params![empty_distance, diameter, limit],
                        reading_from_row,
                    )?,
                };
                collect_readings(rows)
            })
            .await
            .map_err(StorageFailure::from)?;

        Ok(readings
            .into_iter()
            .map(|reading| reading.derive(geometry))
            .collect())
    }
}
