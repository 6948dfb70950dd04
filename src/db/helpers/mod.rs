use anyhow::{anyhow, Context, Result};
use rusqlite::Row;

use crate::db::models::Reading;

pub const READING_COLUMNS: &str =
    "distance_cm, sensor_timestamp, sensor_ip, fetched_at_epoch";

pub fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

/// Maps a row selected with [`READING_COLUMNS`].
pub fn reading_from_row(row: &Row<'_>) -> rusqlite::Result<Reading> {
    Ok(Reading {
        distance_cm: row.get(0)?,
        sensor_timestamp: row.get(1)?,
        sensor_ip: row.get(2)?,
        fetched_at_epoch: row.get(3)?,
    })
}

pub fn collect_readings<I>(rows: I) -> Result<Vec<Reading>>
where
    I: Iterator<Item = rusqlite::Result<Reading>>,
{
    let mut readings = Vec::new();
    for row in rows {
        readings.push(row.context("failed to decode reading row")?);
    }
    Ok(readings)
}
