//! Per-line timetables: which trip visits which line-stop at what time.

use std::collections::HashSet;

use sqlx::{Connection, SqliteConnection};
use tracing::{debug, info};

use crate::domain::{ClockTime, Id, TimetableEntry, TimetableRow, validate};
use crate::error::StoreError;

/// Every timed visit on a line, sorted by stop order then time.
pub async fn for_line(conn: &mut SqliteConnection, line_id: Id) -> Result<Vec<TimetableRow>, StoreError> {
    sqlx::query_as::<_, TimetableRow>(
        r#"
        SELECT
            ls.id AS stop_id,
            ls.line_id,
            ls.direction,
            ls."order",
            t.id AS trip_id,
            t.type_of_day_id,
            tt.id AS trip_time_id,
            tt.arrival_departure_time AS time
        FROM line_stops ls
        INNER JOIN trip_times tt ON ls.id = tt.line_stop_id
        INNER JOIN trips t ON tt.trip_id = t.id
        WHERE ls.line_id = ? AND tt.arrival_departure_time IS NOT NULL
        ORDER BY ls."order", tt.arrival_departure_time, tt.id
        "#,
    )
    .bind(line_id)
    .fetch_all(conn)
    .await
    .map_err(StoreError::during("loading timetable"))
}

/// Save a timetable batch in one transaction.
///
/// Trips the batch mentions that do not exist yet are created first, using
/// the day type of their first entry. Each entry then overwrites the trip
/// time named by `trip_time_id`, or inserts a new one when it has none.
pub async fn save(conn: &mut SqliteConnection, entries: &[TimetableEntry]) -> Result<(), StoreError> {
    validate::non_empty("timetable batch", entries)?;

    let mut tx = conn
        .begin()
        .await
        .map_err(StoreError::during("starting timetable save"))?;

    let mut seen = HashSet::new();
    let mut trips_created = 0u64;
    for entry in entries {
        if !seen.insert(entry.trip_id) {
            continue;
        }
        let result = sqlx::query(
            "INSERT INTO trips (id, type_of_day_id) VALUES (?, ?) ON CONFLICT (id) DO NOTHING",
        )
        .bind(entry.trip_id)
        .bind(entry.type_of_day_id)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::during("creating trips for timetable"))?;
        trips_created += result.rows_affected();
    }

    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO trip_times (id, trip_id, line_stop_id, arrival_departure_time)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                trip_id = excluded.trip_id,
                line_stop_id = excluded.line_stop_id,
                arrival_departure_time = excluded.arrival_departure_time
            "#,
        )
        .bind(entry.trip_time_id)
        .bind(entry.trip_id)
        .bind(entry.stop_id)
        .bind(i64::from(entry.arrival_departure_time))
        .execute(&mut *tx)
        .await
        .map_err(StoreError::during("saving trip time"))?;
    }

    tx.commit()
        .await
        .map_err(StoreError::during("committing timetable save"))?;

    info!(entries = entries.len(), trips_created, "saved timetable");
    Ok(())
}

/// Set the time a trip visits a line-stop, creating the visit if needed.
///
/// Returns the id of the trip time row.
pub async fn set_trip_time(
    conn: &mut SqliteConnection,
    trip_id: Id,
    line_stop_id: Id,
    time: ClockTime,
) -> Result<Id, StoreError> {
    debug!(trip_id, line_stop_id, %time, "setting trip time");

    sqlx::query_scalar(
        r#"
        INSERT INTO trip_times (trip_id, line_stop_id, arrival_departure_time)
        VALUES (?, ?, ?)
        ON CONFLICT (trip_id, line_stop_id) DO UPDATE SET
            arrival_departure_time = excluded.arrival_departure_time
        RETURNING id
        "#,
    )
    .bind(trip_id)
    .bind(line_stop_id)
    .bind(i64::from(time))
    .fetch_one(conn)
    .await
    .map_err(StoreError::during("setting trip time"))
}
