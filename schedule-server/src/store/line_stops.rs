//! The ordered stops each line visits per direction.
//!
//! Batches are applied as an upsert keyed on the presence of an id. Rows that
//! a batch does not mention are left alone. Unlike brigades, nothing is
//! deleted and reinserted.

use sqlx::{Connection, QueryBuilder, Sqlite, SqliteConnection};
use tracing::{debug, info};

use crate::domain::{Id, LineStop, LineStopEdit, validate};
use crate::error::StoreError;

/// Stops of a line joined with their names, sorted by direction then order.
pub async fn for_line(conn: &mut SqliteConnection, line_id: Id) -> Result<Vec<LineStop>, StoreError> {
    sqlx::query_as::<_, LineStop>(
        r#"
        SELECT ls.id, ls.line_id, ls.stop_id, bs.name AS stop_name, ls.direction, ls."order"
        FROM line_stops ls
        INNER JOIN bus_stops bs ON ls.stop_id = bs.id
        WHERE ls.line_id = ?
        ORDER BY ls.direction, ls."order", ls.id
        "#,
    )
    .bind(line_id)
    .fetch_all(conn)
    .await
    .map_err(StoreError::during("listing line stops"))
}

/// Apply a batch of line-stop edits in one transaction.
///
/// An entry with an id updates that row's stop, direction and order; an
/// entry without one inserts a new row. An id that matches nothing fails the
/// whole batch with [`StoreError::NotFound`].
pub async fn upsert(conn: &mut SqliteConnection, entries: &[LineStopEdit]) -> Result<(), StoreError> {
    validate::non_empty("line stop batch", entries)?;
    for entry in entries {
        validate::direction(entry.direction)?;
    }

    let mut tx = conn
        .begin()
        .await
        .map_err(StoreError::during("starting line stop batch"))?;

    let mut inserted = 0usize;
    let mut updated = 0usize;

    for entry in entries {
        match entry.id {
            Some(id) => {
                let result = sqlx::query(
                    r#"UPDATE line_stops SET stop_id = ?, direction = ?, "order" = ? WHERE id = ?"#,
                )
                .bind(entry.stop_id)
                .bind(entry.direction)
                .bind(entry.order)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::during("updating line stop"))?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::not_found(format!("line stop {id} not found")));
                }
                updated += 1;
            }
            None => {
                sqlx::query(
                    r#"INSERT INTO line_stops (line_id, stop_id, direction, "order") VALUES (?, ?, ?, ?)"#,
                )
                .bind(entry.line_id)
                .bind(entry.stop_id)
                .bind(entry.direction)
                .bind(entry.order)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::during("inserting line stop"))?;
                inserted += 1;
            }
        }
    }

    tx.commit()
        .await
        .map_err(StoreError::during("committing line stop batch"))?;

    info!(inserted, updated, "applied line stop batch");
    Ok(())
}

/// Delete the given line stops in a single statement.
///
/// An empty id list does nothing. If none of the ids exist the call fails
/// with [`StoreError::NotFound`].
pub async fn remove(conn: &mut SqliteConnection, ids: &[Id]) -> Result<(), StoreError> {
    if ids.is_empty() {
        debug!("no line stops to remove");
        return Ok(());
    }

    let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM line_stops WHERE id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let result = query
        .build()
        .execute(conn)
        .await
        .map_err(|e| match StoreError::classify("removing line stops", e) {
            StoreError::Conflict { detail, .. } => StoreError::Conflict {
                message: "line stops are still used by trip times".to_string(),
                detail,
            },
            other => other,
        })?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("none of the line stops exist"));
    }

    info!(removed = result.rows_affected(), "removed line stops");
    Ok(())
}
