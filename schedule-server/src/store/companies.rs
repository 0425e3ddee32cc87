//! Operator companies. Standalone records with no relations.

use sqlx::SqliteConnection;
use tracing::info;

use crate::domain::{Company, CompanyFields, Id, validate};
use crate::error::StoreError;

/// All companies, ordered by name.
pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Company>, StoreError> {
    sqlx::query_as::<_, Company>("SELECT id, name, phone, email FROM company ORDER BY name, id")
        .fetch_all(conn)
        .await
        .map_err(StoreError::during("listing companies"))
}

/// One company by id.
pub async fn get(conn: &mut SqliteConnection, id: Id) -> Result<Company, StoreError> {
    sqlx::query_as::<_, Company>("SELECT id, name, phone, email FROM company WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(StoreError::during("loading company"))?
        .ok_or_else(|| StoreError::not_found(format!("company {id} not found")))
}

/// Insert a company with a trimmed name.
pub async fn create(conn: &mut SqliteConnection, fields: &CompanyFields) -> Result<Company, StoreError> {
    let name = validate::required("company name", &fields.name)?;

    let company = sqlx::query_as::<_, Company>(
        "INSERT INTO company (name, phone, email) VALUES (?, ?, ?) RETURNING id, name, phone, email",
    )
    .bind(&name)
    .bind(fields.phone.trim())
    .bind(fields.email.trim())
    .fetch_one(conn)
    .await
    .map_err(StoreError::during("creating company"))?;

    info!(company_id = company.id, name = %company.name, "created company");
    Ok(company)
}

/// Replace a company's details.
pub async fn update(
    conn: &mut SqliteConnection,
    id: Id,
    fields: &CompanyFields,
) -> Result<Company, StoreError> {
    let name = validate::required("company name", &fields.name)?;

    sqlx::query_as::<_, Company>(
        "UPDATE company SET name = ?, phone = ?, email = ? WHERE id = ? RETURNING id, name, phone, email",
    )
    .bind(&name)
    .bind(fields.phone.trim())
    .bind(fields.email.trim())
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(StoreError::during("updating company"))?
    .ok_or_else(|| StoreError::not_found(format!("company {id} not found")))
}

/// Delete a company.
pub async fn delete(conn: &mut SqliteConnection, id: Id) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM company WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(StoreError::during("deleting company"))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(format!("company {id} not found")));
    }

    info!(company_id = id, "deleted company");
    Ok(())
}
