//! Trips and their first-to-last summaries.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::{debug, info};

use crate::domain::{Id, Trip, TripSummary};
use crate::error::StoreError;

/// Highest trip id in use, or 0 when there are no trips.
///
/// Trip ids are chosen by the client, which uses this to pick the next one.
pub async fn max_id(conn: &mut SqliteConnection) -> Result<Id, StoreError> {
    sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) FROM trips")
        .fetch_one(conn)
        .await
        .map_err(StoreError::during("loading max trip id"))
}

/// Create a trip with a caller-chosen id.
pub async fn create(
    conn: &mut SqliteConnection,
    id: Id,
    type_of_day_id: Id,
) -> Result<Trip, StoreError> {
    let trip = sqlx::query_as::<_, Trip>(
        "INSERT INTO trips (id, type_of_day_id) VALUES (?, ?) RETURNING id, type_of_day_id",
    )
    .bind(id)
    .bind(type_of_day_id)
    .fetch_one(conn)
    .await
    .map_err(|e| match StoreError::classify("creating trip", e) {
        StoreError::Conflict { detail, .. } => StoreError::Conflict {
            message: format!("trip {id} already exists or type of day {type_of_day_id} is unknown"),
            detail,
        },
        other => other,
    })?;

    info!(trip_id = id, type_of_day_id, "created trip");
    Ok(trip)
}

/// Trips reduced to their earliest and latest visit.
///
/// `type_of_day_id` keeps trips of one day type. `min_duration_minutes` keeps
/// trips strictly longer than that many minutes. The line number is taken
/// from the line of the earliest visit.
pub async fn summaries(
    conn: &mut SqliteConnection,
    type_of_day_id: Option<Id>,
    min_duration_minutes: Option<i64>,
) -> Result<Vec<TripSummary>, StoreError> {
    debug!(?type_of_day_id, ?min_duration_minutes, "listing trip summaries");

    let mut query = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT DISTINCT
            t.id AS trip_id,
            l.number AS line_number,
            start_stop.name AS start_stop,
            end_stop.name AS end_stop,
            ft.arrival_departure_time AS start_time,
            lt.arrival_departure_time AS end_time
        FROM trips t
        JOIN trip_times ft ON ft.trip_id = t.id
        JOIN line_stops fls ON ft.line_stop_id = fls.id
        JOIN bus_stops start_stop ON fls.stop_id = start_stop.id
        JOIN trip_times lt ON lt.trip_id = t.id
        JOIN line_stops lls ON lt.line_stop_id = lls.id
        JOIN bus_stops end_stop ON lls.stop_id = end_stop.id
        JOIN lines l ON fls.line_id = l.id
        WHERE ft.arrival_departure_time =
                (SELECT MIN(arrival_departure_time) FROM trip_times WHERE trip_id = t.id)
          AND lt.arrival_departure_time =
                (SELECT MAX(arrival_departure_time) FROM trip_times WHERE trip_id = t.id)
        "#,
    );

    if let Some(day) = type_of_day_id {
        query.push(" AND t.type_of_day_id = ").push_bind(day);
    }
    if let Some(minutes) = min_duration_minutes {
        query
            .push(" AND (lt.arrival_departure_time - ft.arrival_departure_time) > ")
            .push_bind(minutes.saturating_mul(60));
    }
    query.push(" ORDER BY start_time, trip_id");

    query
        .build_query_as::<TripSummary>()
        .fetch_all(conn)
        .await
        .map_err(StoreError::during("listing trip summaries"))
}
