//! Lines. Line numbers are unique.

use sqlx::SqliteConnection;
use tracing::info;

use crate::domain::{Id, Line, validate};
use crate::error::StoreError;

/// All lines, ordered by number.
pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Line>, StoreError> {
    sqlx::query_as::<_, Line>("SELECT id, number FROM lines ORDER BY number ASC")
        .fetch_all(conn)
        .await
        .map_err(StoreError::during("listing lines"))
}

/// A single line.
pub async fn get(conn: &mut SqliteConnection, id: Id) -> Result<Line, StoreError> {
    sqlx::query_as::<_, Line>("SELECT id, number FROM lines WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(StoreError::during("loading line"))?
        .ok_or_else(|| StoreError::not_found(format!("line {id} not found")))
}

/// Create a line.
pub async fn create(conn: &mut SqliteConnection, number: &str) -> Result<Line, StoreError> {
    let number = validate::required("line number", number)?;

    let line = sqlx::query_as::<_, Line>("INSERT INTO lines (number) VALUES (?) RETURNING id, number")
        .bind(&number)
        .fetch_one(conn)
        .await
        .map_err(|e| duplicate_number(&number, "creating line", e))?;

    info!(line_id = line.id, number = %line.number, "created line");
    Ok(line)
}

/// Renumber a line.
pub async fn update(conn: &mut SqliteConnection, id: Id, number: &str) -> Result<Line, StoreError> {
    let number = validate::required("line number", number)?;

    sqlx::query_as::<_, Line>("UPDATE lines SET number = ? WHERE id = ? RETURNING id, number")
        .bind(&number)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| duplicate_number(&number, "updating line", e))?
        .ok_or_else(|| StoreError::not_found(format!("line {id} not found")))
}

/// Delete a line. Lines that still have stops cannot be deleted.
pub async fn delete(conn: &mut SqliteConnection, id: Id) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM lines WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| match StoreError::classify("deleting line", e) {
            StoreError::Conflict { detail, .. } => StoreError::Conflict {
                message: format!("line {id} still has stops"),
                detail,
            },
            other => other,
        })?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(format!("line {id} not found")));
    }

    info!(line_id = id, "deleted line");
    Ok(())
}

fn duplicate_number(number: &str, context: &str, err: sqlx::Error) -> StoreError {
    match StoreError::classify(context, err) {
        StoreError::Conflict { detail, .. } => StoreError::Conflict {
            message: format!("line number '{number}' already exists"),
            detail,
        },
        other => other,
    }
}
