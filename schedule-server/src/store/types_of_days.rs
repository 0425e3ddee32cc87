//! Day types ("weekday", "saturday", ...) that trips and brigades run on.

use sqlx::SqliteConnection;
use tracing::info;

use crate::domain::{Id, TypeOfDay, validate};
use crate::error::StoreError;

/// All day types, ordered by id.
pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<TypeOfDay>, StoreError> {
    sqlx::query_as::<_, TypeOfDay>("SELECT id, name, shortage_name FROM types_of_days ORDER BY id")
        .fetch_all(conn)
        .await
        .map_err(StoreError::during("listing types of day"))
}

/// One day type by id.
pub async fn get(conn: &mut SqliteConnection, id: Id) -> Result<TypeOfDay, StoreError> {
    sqlx::query_as::<_, TypeOfDay>("SELECT id, name, shortage_name FROM types_of_days WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(StoreError::during("loading type of day"))?
        .ok_or_else(|| StoreError::not_found(format!("type of day {id} not found")))
}

/// Insert a day type with a trimmed name.
pub async fn create(
    conn: &mut SqliteConnection,
    name: &str,
    shortage_name: Option<&str>,
) -> Result<TypeOfDay, StoreError> {
    let name = validate::required("type of day name", name)?;

    let day = sqlx::query_as::<_, TypeOfDay>(
        "INSERT INTO types_of_days (name, shortage_name) VALUES (?, ?) RETURNING id, name, shortage_name",
    )
    .bind(&name)
    .bind(shortage(shortage_name))
    .fetch_one(conn)
    .await
    .map_err(StoreError::during("creating type of day"))?;

    info!(type_of_day_id = day.id, name = %day.name, "created type of day");
    Ok(day)
}

/// Rename a day type and replace its abbreviation.
pub async fn update(
    conn: &mut SqliteConnection,
    id: Id,
    name: &str,
    shortage_name: Option<&str>,
) -> Result<TypeOfDay, StoreError> {
    let name = validate::required("type of day name", name)?;

    sqlx::query_as::<_, TypeOfDay>(
        "UPDATE types_of_days SET name = ?, shortage_name = ? WHERE id = ? RETURNING id, name, shortage_name",
    )
    .bind(&name)
    .bind(shortage(shortage_name))
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(StoreError::during("updating type of day"))?
    .ok_or_else(|| StoreError::not_found(format!("type of day {id} not found")))
}

/// Delete a day type. Rejected while trips or brigades still use it.
pub async fn delete(conn: &mut SqliteConnection, id: Id) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM types_of_days WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| match StoreError::classify("deleting type of day", e) {
            StoreError::Conflict { detail, .. } => StoreError::Conflict {
                message: format!("type of day {id} is still used by trips or brigades"),
                detail,
            },
            other => other,
        })?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(format!("type of day {id} not found")));
    }

    info!(type_of_day_id = id, "deleted type of day");
    Ok(())
}

/// The abbreviation printed on brigade sheets.
pub async fn shortage_name(conn: &mut SqliteConnection, id: Id) -> Result<String, StoreError> {
    let found: Option<Option<String>> =
        sqlx::query_scalar("SELECT shortage_name FROM types_of_days WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(StoreError::during("loading shortage name"))?;

    found
        .flatten()
        .ok_or_else(|| StoreError::not_found(format!("type of day {id} has no shortage name")))
}

/// Blank abbreviations are stored as NULL.
fn shortage(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Database, fixtures};

    #[tokio::test]
    async fn crud_roundtrip() {
        let db = Database::in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        let weekday = create(&mut conn, "Weekday", Some("R")).await.unwrap();
        let sunday = create(&mut conn, "Sunday", None).await.unwrap();
        assert_eq!(sunday.shortage_name, None);

        assert_eq!(list(&mut conn).await.unwrap(), vec![weekday.clone(), sunday.clone()]);

        let updated = update(&mut conn, sunday.id, "Sunday", Some("N")).await.unwrap();
        assert_eq!(updated.shortage_name.as_deref(), Some("N"));
        assert_eq!(get(&mut conn, sunday.id).await.unwrap(), updated);

        delete(&mut conn, weekday.id).await.unwrap();
        assert_eq!(list(&mut conn).await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn shortage_name_lookup() {
        let db = Database::in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        let with = create(&mut conn, "Saturday", Some(" S ")).await.unwrap();
        let without = create(&mut conn, "Holiday", Some("")).await.unwrap();

        assert_eq!(shortage_name(&mut conn, with.id).await.unwrap(), "S");
        assert!(matches!(
            shortage_name(&mut conn, without.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            shortage_name(&mut conn, 99).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn referenced_day_cannot_be_deleted() {
        let db = Database::in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        let day = fixtures::type_of_day(&mut conn, "Weekday", "R").await;
        fixtures::trip(&mut conn, 1, day).await;

        assert!(matches!(
            delete(&mut conn, day).await,
            Err(StoreError::Conflict { .. })
        ));
        assert!(matches!(
            delete(&mut conn, 42).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn blank_name_rejected() {
        let db = Database::in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        assert!(matches!(
            create(&mut conn, " ", None).await,
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            update(&mut conn, 1, "", None).await,
            Err(StoreError::Validation(_))
        ));
    }
}
