mod helpers;

use cuve_lib::db::{ExtremeOrder, Period};
use cuve_lib::volume::TankGeometry;
use helpers::{reading, reference_tank, temp_db};

const NOW: i64 = 1_714_557_600;
const DAY: i64 = 86_400;

#[tokio::test]
async fn duplicate_sensor_timestamp_is_stored_once() {
    let (_dir, db) = temp_db();

    let first = reading("2024-05-01T10:00:00", 87.0, NOW);
    let again = reading("2024-05-01T10:00:00", 87.0, NOW + 60);

    assert!(db.append_reading(&first).await.unwrap());
    assert!(!db.append_reading(&again).await.unwrap());
    assert_eq!(db.count_readings().await.unwrap(), 1);

    // The first observation wins.
    let last = db.last_reading().await.unwrap().unwrap();
    assert_eq!(last.fetched_at_epoch, NOW);
}

#[tokio::test]
async fn dedup_covers_older_rows_too() {
    let (_dir, db) = temp_db();

    assert!(db.append_reading(&reading("a", 50.0, NOW)).await.unwrap());
    assert!(db.append_reading(&reading("b", 51.0, NOW + 60)).await.unwrap());
    assert!(!db.append_reading(&reading("a", 50.0, NOW + 120)).await.unwrap());
    assert_eq!(db.count_readings().await.unwrap(), 2);
}

#[tokio::test]
async fn empty_store_has_no_last_reading() {
    let (_dir, db) = temp_db();
    assert!(db.last_reading().await.unwrap().is_none());
    assert!(db
        .extremes_at(&reference_tank(), Period::All, ExtremeOrder::Max, 3, NOW)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn last_reading_follows_most_recent_fetch() {
    let (_dir, db) = temp_db();

    for i in 0..10 {
        let r = reading(&format!("ts-{i:02}"), 100.0 - i as f64, NOW + i * 60);
        db.append_reading(&r).await.unwrap();
        assert_eq!(db.last_reading().await.unwrap(), Some(r));
    }
}

#[tokio::test]
async fn last_reading_breaks_ties_on_sensor_timestamp() {
    let (_dir, db) = temp_db();

    db.append_reading(&reading("b", 60.0, NOW)).await.unwrap();
    db.append_reading(&reading("c", 61.0, NOW)).await.unwrap();
    db.append_reading(&reading("a", 62.0, NOW)).await.unwrap();

    let last = db.last_reading().await.unwrap().unwrap();
    assert_eq!(last.sensor_timestamp, "c");
}

#[tokio::test]
async fn integer_sensor_timestamps_tie_break_numerically() {
    let (_dir, db) = temp_db();

    db.append_reading(&reading("1000", 60.0, NOW)).await.unwrap();
    db.append_reading(&reading("999", 61.0, NOW)).await.unwrap();
    db.append_reading(&reading("998", 62.0, NOW - 1)).await.unwrap();

    let last = db.last_reading().await.unwrap().unwrap();
    assert_eq!(last.sensor_timestamp, "1000");

    let recent = db.recent_readings(3).await.unwrap();
    let stamps: Vec<_> = recent.iter().map(|r| r.sensor_timestamp.as_str()).collect();
    assert_eq!(stamps, ["1000", "999", "998"]);
}

#[tokio::test]
async fn recent_readings_are_newest_first() {
    let (_dir, db) = temp_db();
    for i in 0..5 {
        db.append_reading(&reading(&format!("t{i}"), 80.0, NOW + i))
            .await
            .unwrap();
    }

    let recent = db.recent_readings(3).await.unwrap();
    let stamps: Vec<_> = recent.iter().map(|r| r.sensor_timestamp.as_str()).collect();
    assert_eq!(stamps, ["t4", "t3", "t2"]);
}

#[tokio::test]
async fn extremes_rank_by_volume() {
    let (_dir, db) = temp_db();
    let tank = reference_tank();

    // Larger distance means less water: 200cm < 190cm < 120cm < 40cm in volume.
    for (i, distance) in [190.0, 120.0, 200.0, 40.0].into_iter().enumerate() {
        let r = reading(&format!("t{i}"), distance, NOW - 3600 + i as i64);
        db.append_reading(&r).await.unwrap();
    }

    let max = db
        .extremes_at(&tank, Period::Day, ExtremeOrder::Max, 1, NOW)
        .await
        .unwrap();
    assert_eq!(max.len(), 1);
    assert_eq!(max[0].reading.distance_cm, 40.0);

    let min = db
        .extremes_at(&tank, Period::Day, ExtremeOrder::Min, 2, NOW)
        .await
        .unwrap();
    let distances: Vec<f64> = min.iter().map(|d| d.reading.distance_cm).collect();
    assert_eq!(distances, [200.0, 190.0]);
    assert!(min[0].volume_liters() < min[1].volume_liters());
}

#[tokio::test]
async fn extremes_never_return_more_than_available() {
    let (_dir, db) = temp_db();
    db.append_reading(&reading("only", 90.0, NOW)).await.unwrap();

    let rows = db
        .extremes_at(&reference_tank(), Period::Week, ExtremeOrder::Min, 10, NOW)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    let none = db
        .extremes_at(&reference_tank(), Period::Week, ExtremeOrder::Min, 0, NOW)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn period_window_is_inclusive() {
    let (_dir, db) = temp_db();
    let tank = reference_tank();

    db.append_reading(&reading("edge", 30.0, NOW - DAY)).await.unwrap();
    db.append_reading(&reading("outside", 25.0, NOW - DAY - 1)).await.unwrap();
    db.append_reading(&reading("now", 150.0, NOW)).await.unwrap();
    db.append_reading(&reading("future", 21.0, NOW + 1)).await.unwrap();

    let day = db
        .extremes_at(&tank, Period::Day, ExtremeOrder::Max, 10, NOW)
        .await
        .unwrap();
    let stamps: Vec<_> = day
        .iter()
        .map(|d| d.reading.sensor_timestamp.as_str())
        .collect();
    assert_eq!(stamps, ["edge", "now"]);

    let all = db
        .extremes_at(&tank, Period::All, ExtremeOrder::Max, 10, NOW)
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].reading.sensor_timestamp, "future");
}

#[tokio::test]
async fn clamped_volumes_tie_on_earliest_fetch() {
    let (_dir, db) = temp_db();
    let tank = reference_tank();

    // All three are above the full mark and read as exactly full.
    db.append_reading(&reading("late", 5.0, NOW - 10)).await.unwrap();
    db.append_reading(&reading("early", 15.0, NOW - 30)).await.unwrap();
    db.append_reading(&reading("middle", 20.0, NOW - 20)).await.unwrap();
    db.append_reading(&reading("lower", 60.0, NOW - 40)).await.unwrap();

    let max = db
        .extremes_at(&tank, Period::Day, ExtremeOrder::Max, 3, NOW)
        .await
        .unwrap();
    let stamps: Vec<_> = max
        .iter()
        .map(|d| d.reading.sensor_timestamp.as_str())
        .collect();
    assert_eq!(stamps, ["early", "middle", "late"]);
    assert!(max.iter().all(|d| d.fill_percent() == 100.0));
    assert!(max[0].estimate.out_of_range);
    assert!(!max[1].estimate.out_of_range);
}

#[tokio::test]
async fn volumes_follow_the_geometry_used_at_query_time() {
    let (_dir, db) = temp_db();
    db.append_reading(&reading("t", 112.25, NOW)).await.unwrap();

    let original = reference_tank();
    let recalibrated = TankGeometry::new(12_000.0, 184.5, 436.4, 20.0).unwrap();

    let before = db
        .extremes_at(&original, Period::All, ExtremeOrder::Max, 1, NOW)
        .await
        .unwrap();
    let after = db
        .extremes_at(&recalibrated, Period::All, ExtremeOrder::Max, 1, NOW)
        .await
        .unwrap();

    assert!((before[0].volume_liters() - 5_000.0).abs() < 1e-6);
    assert!((after[0].volume_liters() - 6_000.0).abs() < 1e-6);
}

#[tokio::test]
async fn reopening_keeps_stored_readings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cuve.sqlite3");

    {
        let db = cuve_lib::db::Database::new(path.clone()).unwrap();
        db.append_reading(&reading("persisted", 70.0, NOW)).await.unwrap();
    }

    let db = cuve_lib::db::Database::new(path).unwrap();
    assert_eq!(db.count_readings().await.unwrap(), 1);
    assert!(!db.append_reading(&reading("persisted", 70.0, NOW + 5)).await.unwrap());
}
