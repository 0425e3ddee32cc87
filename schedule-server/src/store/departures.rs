//! The departure board of a stop.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::domain::{Departure, DepartureWindow, Id, validate};
use crate::error::StoreError;

/// Departures from `stop_id` in the `window_minutes` after `now`.
///
/// A departure is any timed visit of the stop by a trip of the given day
/// type, unless the trip ends at that stop. The window may run past
/// midnight, in which case early-morning departures are included. A window
/// longer than [`validate::MAX_WINDOW_MINUTES`] is rejected. At most one
/// departure per time and destination is returned, ordered by time.
pub async fn board(
    conn: &mut SqliteConnection,
    stop_id: Id,
    window_minutes: u32,
    type_of_day_id: Id,
    now: NaiveDateTime,
) -> Result<Vec<Departure>, StoreError> {
    validate::window_minutes(window_minutes)?;
    let window = DepartureWindow::starting_at(now, window_minutes);
    debug!(
        stop_id,
        type_of_day_id,
        ?window,
        crosses_midnight = window.crosses_midnight(),
        "querying departure board"
    );

    let mut query = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT DISTINCT
            ft.arrival_departure_time AS departure_time,
            end_stop.name AS destination,
            l.number AS line_number
        FROM trips t
        JOIN trip_times ft ON t.id = ft.trip_id
        JOIN line_stops fls ON ft.line_stop_id = fls.id
        JOIN bus_stops here ON fls.stop_id = here.id
        JOIN trip_times lt ON t.id = lt.trip_id
        JOIN line_stops lls ON lt.line_stop_id = lls.id
        JOIN bus_stops end_stop ON lls.stop_id = end_stop.id
        JOIN lines l ON fls.line_id = l.id
        WHERE fls.stop_id = "#,
    );
    query.push_bind(stop_id);

    query.push(" AND (");
    for (i, (from, to)) in window.ranges().into_iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        query
            .push("(ft.arrival_departure_time >= ")
            .push_bind(i64::from(from))
            .push(" AND ft.arrival_departure_time <= ")
            .push_bind(i64::from(to))
            .push(")");
    }
    query.push(")");

    query
        .push(" AND t.type_of_day_id = ")
        .push_bind(type_of_day_id)
        .push(
            r#"
          AND here.id != end_stop.id
          AND lt.arrival_departure_time =
                (SELECT MAX(tt.arrival_departure_time) FROM trip_times tt WHERE tt.trip_id = t.id)
        ORDER BY ft.arrival_departure_time, t.id
        "#,
        );

    let rows = query
        .build_query_as::<Departure>()
        .fetch_all(conn)
        .await
        .map_err(StoreError::during("querying departures"))?;
    debug_assert!(rows.iter().all(|d| window.contains(d.departure_time)));

    Ok(dedup(rows))
}

/// Keep the first departure for each time and destination, then order by time.
pub fn dedup(rows: Vec<Departure>) -> Vec<Departure> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Departure> = rows
        .into_iter()
        .filter(|d| seen.insert((d.departure_time, d.destination.clone())))
        .collect();
    kept.sort_by_key(|d| d.departure_time);
    kept
}
