//! Bus stops.

use sqlx::SqliteConnection;
use tracing::info;

use crate::domain::{Id, Stop, validate};
use crate::error::StoreError;

/// All stops, ordered by name.
pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Stop>, StoreError> {
    sqlx::query_as::<_, Stop>("SELECT id, name FROM bus_stops ORDER BY name ASC, id ASC")
        .fetch_all(conn)
        .await
        .map_err(StoreError::during("listing stops"))
}

/// A single stop.
pub async fn get(conn: &mut SqliteConnection, id: Id) -> Result<Stop, StoreError> {
    sqlx::query_as::<_, Stop>("SELECT id, name FROM bus_stops WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(StoreError::during("loading stop"))?
        .ok_or_else(|| StoreError::not_found(format!("stop {id} not found")))
}

/// Create a stop.
pub async fn create(conn: &mut SqliteConnection, name: &str) -> Result<Stop, StoreError> {
    let name = validate::required("stop name", name)?;

    let stop = sqlx::query_as::<_, Stop>("INSERT INTO bus_stops (name) VALUES (?) RETURNING id, name")
        .bind(&name)
        .fetch_one(conn)
        .await
        .map_err(StoreError::during("creating stop"))?;

    info!(stop_id = stop.id, name = %stop.name, "created stop");
    Ok(stop)
}

/// Rename a stop.
pub async fn update(conn: &mut SqliteConnection, id: Id, name: &str) -> Result<Stop, StoreError> {
    let name = validate::required("stop name", name)?;

    sqlx::query_as::<_, Stop>("UPDATE bus_stops SET name = ? WHERE id = ? RETURNING id, name")
        .bind(&name)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(StoreError::during("updating stop"))?
        .ok_or_else(|| StoreError::not_found(format!("stop {id} not found")))
}

/// Delete a stop.
///
/// Fails with [`StoreError::Conflict`] while any line still visits the stop.
pub async fn delete(conn: &mut SqliteConnection, id: Id) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM bus_stops WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| match StoreError::classify("deleting stop", e) {
            StoreError::Conflict { detail, .. } => StoreError::Conflict {
                message: format!("stop {id} is still used by a line"),
                detail,
            },
            other => other,
        })?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(format!("stop {id} not found")));
    }

    info!(stop_id = id, "deleted stop");
    Ok(())
}
