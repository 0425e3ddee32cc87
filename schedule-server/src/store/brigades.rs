//! Brigades: named crew duties, each an ordered list of trips.
//!
//! The brigades of a day type are only ever replaced as a whole. A
//! replacement deletes every brigade of the day type (their trip
//! assignments go with them) and inserts the submitted list in order, all in
//! one transaction. Readers see either the old set or the new one.

use futures::TryStreamExt;
use sqlx::{Connection, FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::{debug, info};

use crate::domain::{Brigade, BrigadeDef, BrigadeTrip, Id, validate};
use crate::error::StoreError;

const SELECT_BRIGADES: &str = r#"
    SELECT
        b.id AS brigade_id,
        b.type_of_days_id AS type_of_day_id,
        b.name,
        b.working_time,
        td.shortage_name,
        bt.id AS brigade_trip_id,
        bt.trip_id
    FROM brigades b
    LEFT JOIN brigades_trips bt ON b.id = bt.brigade_id
    LEFT JOIN types_of_days td ON b.type_of_days_id = td.id
"#;

/// One brigade joined with at most one of its trips.
#[derive(Debug, FromRow)]
struct BrigadeTripRow {
    brigade_id: Id,
    type_of_day_id: Id,
    name: String,
    working_time: i32,
    shortage_name: Option<String>,
    brigade_trip_id: Option<Id>,
    trip_id: Option<Id>,
}

/// Brigades of a day type, ordered by id, each with its trips in order.
pub async fn for_day(conn: &mut SqliteConnection, type_of_day_id: Id) -> Result<Vec<Brigade>, StoreError> {
    let mut query = QueryBuilder::<Sqlite>::new(SELECT_BRIGADES);
    query.push(" WHERE b.type_of_days_id = ").push_bind(type_of_day_id);
    collect(conn, query).await
}

/// Brigades of any day type working strictly less than `threshold`.
pub async fn shorter_than(conn: &mut SqliteConnection, threshold: i32) -> Result<Vec<Brigade>, StoreError> {
    let mut query = QueryBuilder::<Sqlite>::new(SELECT_BRIGADES);
    query.push(" WHERE b.working_time < ").push_bind(threshold);
    collect(conn, query).await
}

async fn collect(
    conn: &mut SqliteConnection,
    mut query: QueryBuilder<'_, Sqlite>,
) -> Result<Vec<Brigade>, StoreError> {
    query.push(" ORDER BY b.id, bt.id");

    let mut rows = query.build_query_as::<BrigadeTripRow>().fetch(conn);
    let mut brigades: Vec<Brigade> = Vec::new();

    while let Some(row) = rows
        .try_next()
        .await
        .map_err(StoreError::during("loading brigades"))?
    {
        let trip = match (row.brigade_trip_id, row.trip_id) {
            (Some(brigade_trip_id), Some(trip_id)) => Some(BrigadeTrip {
                brigade_trip_id,
                trip_id,
            }),
            _ => None,
        };

        // Rows arrive grouped by brigade
        if let Some(last) = brigades.last_mut()
            && last.brigade_id == row.brigade_id
        {
            last.trips.extend(trip);
            continue;
        }

        brigades.push(Brigade {
            brigade_id: row.brigade_id,
            type_of_day_id: row.type_of_day_id,
            name: row.name,
            working_time: row.working_time,
            shortage_name: row.shortage_name,
            trips: trip.into_iter().collect(),
        });
    }

    Ok(brigades)
}

/// Replace every brigade of a day type with `brigades`, atomically.
///
/// Brigades are inserted in the given order with the given day type, and
/// each brigade's trips in their given order. On any failure the previous
/// brigades are left exactly as they were. Returns the stored brigades.
pub async fn replace(
    conn: &mut SqliteConnection,
    type_of_day_id: Id,
    brigades: &[BrigadeDef],
) -> Result<Vec<Brigade>, StoreError> {
    validate::non_empty("brigade list", brigades)?;
    for brigade in brigades {
        validate::required("brigade name", &brigade.name)?;
    }

    let mut tx = conn
        .begin()
        .await
        .map_err(StoreError::during("starting brigade replacement"))?;

    let removed = sqlx::query("DELETE FROM brigades WHERE type_of_days_id = ?")
        .bind(type_of_day_id)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::during("removing brigades"))?
        .rows_affected();
    debug!(type_of_day_id, removed, "removed previous brigades");

    for brigade in brigades {
        let brigade_id: Id = sqlx::query_scalar(
            "INSERT INTO brigades (type_of_days_id, name, working_time) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(type_of_day_id)
        .bind(brigade.name.trim())
        .bind(brigade.working_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::during("inserting brigade"))?;

        for &trip_id in &brigade.trips {
            sqlx::query("INSERT INTO brigades_trips (brigade_id, trip_id) VALUES (?, ?)")
                .bind(brigade_id)
                .bind(trip_id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::during("assigning trip to brigade"))?;
        }
    }

    tx.commit()
        .await
        .map_err(StoreError::during("committing brigade replacement"))?;

    info!(type_of_day_id, removed, inserted = brigades.len(), "replaced brigades");
    for_day(conn, type_of_day_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Database, Conn, fixtures};

    fn def(name: &str, working_time: i32, trips: &[Id]) -> BrigadeDef {
        BrigadeDef {
            name: name.to_string(),
            working_time,
            trips: trips.to_vec(),
        }
    }

    fn shape(brigades: &[Brigade]) -> Vec<(String, Vec<Id>)> {
        brigades
            .iter()
            .map(|b| (b.name.clone(), b.trips.iter().map(|t| t.trip_id).collect()))
            .collect()
    }

    async fn seeded() -> (Database, Conn, Id) {
        let db = Database::in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let day = fixtures::type_of_day(&mut conn, "Weekday", "R").await;
        for trip in 1..=5 {
            fixtures::trip(&mut conn, trip, day).await;
        }
        (db, conn, day)
    }

    #[tokio::test]
    async fn replace_preserves_submitted_order() {
        let (_db, mut conn, day) = seeded().await;

        let stored = replace(
            &mut conn,
            day,
            &[def("B-2", 420, &[3, 1, 2]), def("A-1", 480, &[5, 4])],
        )
        .await
        .unwrap();

        assert_eq!(
            shape(&stored),
            vec![
                ("B-2".to_string(), vec![3, 1, 2]),
                ("A-1".to_string(), vec![5, 4]),
            ]
        );
        assert!(stored[0].brigade_id < stored[1].brigade_id);
        assert!(stored.iter().all(|b| b.type_of_day_id == day));
        assert!(stored.iter().all(|b| b.shortage_name.as_deref() == Some("R")));
        assert_eq!(for_day(&mut conn, day).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn replace_discards_previous_set() {
        let (_db, mut conn, day) = seeded().await;

        replace(&mut conn, day, &[def("A", 400, &[1, 2]), def("B", 400, &[3])])
            .await
            .unwrap();
        let stored = replace(&mut conn, day, &[def("C", 300, &[2])]).await.unwrap();

        assert_eq!(shape(&stored), vec![("C".to_string(), vec![2])]);

        let orphans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM brigades_trips WHERE brigade_id NOT IN (SELECT id FROM brigades)",
        )
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn failed_replace_keeps_previous_state() {
        let (_db, mut conn, day) = seeded().await;

        let before = replace(&mut conn, day, &[def("A", 400, &[1, 2]), def("B", 400, &[3])])
            .await
            .unwrap();

        // Trip 999 does not exist, so the second brigade's assignment fails
        let err = replace(&mut conn, day, &[def("C", 300, &[4]), def("D", 300, &[999])])
            .await
            .unwrap_err();
        match &err {
            StoreError::Conflict { detail, .. } => assert!(detail.contains("FOREIGN KEY")),
            other => panic!("expected conflict, got {other:?}"),
        }

        assert_eq!(for_day(&mut conn, day).await.unwrap(), before);
    }

    #[tokio::test]
    async fn brigade_without_trips_has_empty_list() {
        let (_db, mut conn, day) = seeded().await;

        let stored = replace(&mut conn, day, &[def("Reserve", 120, &[])]).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].trips.is_empty());
    }

    #[tokio::test]
    async fn replace_only_touches_one_day_type() {
        let (_db, mut conn, weekday) = seeded().await;
        let sunday = fixtures::type_of_day(&mut conn, "Sunday", "N").await;
        fixtures::trip(&mut conn, 10, sunday).await;

        replace(&mut conn, sunday, &[def("S1", 300, &[10])]).await.unwrap();
        replace(&mut conn, weekday, &[def("W1", 400, &[1])]).await.unwrap();
        replace(&mut conn, weekday, &[def("W2", 400, &[2])]).await.unwrap();

        assert_eq!(
            shape(&for_day(&mut conn, sunday).await.unwrap()),
            vec![("S1".to_string(), vec![10])]
        );
        assert_eq!(
            shape(&for_day(&mut conn, weekday).await.unwrap()),
            vec![("W2".to_string(), vec![2])]
        );
    }

    #[tokio::test]
    async fn invalid_input_rejected_before_store() {
        let (_db, mut conn, day) = seeded().await;
        replace(&mut conn, day, &[def("A", 400, &[1])]).await.unwrap();

        assert!(matches!(
            replace(&mut conn, day, &[]).await,
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            replace(&mut conn, day, &[def(" ", 400, &[2])]).await,
            Err(StoreError::Validation(_))
        ));
        assert_eq!(shape(&for_day(&mut conn, day).await.unwrap()), vec![("A".to_string(), vec![1])]);
    }

    #[tokio::test]
    async fn filter_by_working_time_spans_day_types() {
        let (_db, mut conn, weekday) = seeded().await;
        let sunday = fixtures::type_of_day(&mut conn, "Sunday", "N").await;

        replace(&mut conn, weekday, &[def("Long", 480, &[1]), def("Short", 240, &[2])])
            .await
            .unwrap();
        replace(&mut conn, sunday, &[def("Sunday short", 200, &[])])
            .await
            .unwrap();

        let names: Vec<_> = shorter_than(&mut conn, 480)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Short", "Sunday short"]);
        assert!(shorter_than(&mut conn, 200).await.unwrap().is_empty());
    }
}
