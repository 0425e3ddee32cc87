//! Seed helpers for store tests.

use sqlx::SqliteConnection;

use crate::domain::{ClockTime, Id};

pub async fn stop(conn: &mut SqliteConnection, name: &str) -> Id {
    sqlx::query_scalar("INSERT INTO bus_stops (name) VALUES (?) RETURNING id")
        .bind(name)
        .fetch_one(conn)
        .await
        .unwrap()
}

pub async fn line(conn: &mut SqliteConnection, number: &str) -> Id {
    sqlx::query_scalar("INSERT INTO lines (number) VALUES (?) RETURNING id")
        .bind(number)
        .fetch_one(conn)
        .await
        .unwrap()
}

pub async fn line_stop(
    conn: &mut SqliteConnection,
    line_id: Id,
    stop_id: Id,
    direction: i32,
    order: i32,
) -> Id {
    sqlx::query_scalar(
        r#"INSERT INTO line_stops (line_id, stop_id, direction, "order") VALUES (?, ?, ?, ?) RETURNING id"#,
    )
    .bind(line_id)
    .bind(stop_id)
    .bind(direction)
    .bind(order)
    .fetch_one(conn)
    .await
    .unwrap()
}

pub async fn type_of_day(conn: &mut SqliteConnection, name: &str, shortage: &str) -> Id {
    sqlx::query_scalar("INSERT INTO types_of_days (name, shortage_name) VALUES (?, ?) RETURNING id")
        .bind(name)
        .bind(shortage)
        .fetch_one(conn)
        .await
        .unwrap()
}

pub async fn trip(conn: &mut SqliteConnection, id: Id, type_of_day_id: Id) {
    sqlx::query("INSERT INTO trips (id, type_of_day_id) VALUES (?, ?)")
        .bind(id)
        .bind(type_of_day_id)
        .execute(conn)
        .await
        .unwrap();
}

pub async fn trip_time(conn: &mut SqliteConnection, trip_id: Id, line_stop_id: Id, time: &str) -> Id {
    let time = ClockTime::parse(time).unwrap();
    sqlx::query_scalar(
        "INSERT INTO trip_times (trip_id, line_stop_id, arrival_departure_time) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(trip_id)
    .bind(line_stop_id)
    .bind(i64::from(time))
    .fetch_one(conn)
    .await
    .unwrap()
}

/// A line "N1" running A → B → C in direction 0.
pub struct SimpleLine {
    pub line_id: Id,
    pub stops: [Id; 3],
    pub line_stops: [Id; 3],
}

pub async fn simple_line(conn: &mut SqliteConnection, number: &str) -> SimpleLine {
    let line_id = line(&mut *conn, number).await;
    let a = stop(&mut *conn, "Alpha").await;
    let b = stop(&mut *conn, "Beta").await;
    let c = stop(&mut *conn, "Gamma").await;
    let ls_a = line_stop(&mut *conn, line_id, a, 0, 1).await;
    let ls_b = line_stop(&mut *conn, line_id, b, 0, 2).await;
    let ls_c = line_stop(&mut *conn, line_id, c, 0, 3).await;

    SimpleLine {
        line_id,
        stops: [a, b, c],
        line_stops: [ls_a, ls_b, ls_c],
    }
}

/// A trip visiting the given line-stops at the given times.
pub async fn trip_with_times(
    conn: &mut SqliteConnection,
    trip_id: Id,
    type_of_day_id: Id,
    visits: &[(Id, &str)],
) {
    trip(&mut *conn, trip_id, type_of_day_id).await;
    for &(line_stop_id, time) in visits {
        trip_time(&mut *conn, trip_id, line_stop_id, time).await;
    }
}
