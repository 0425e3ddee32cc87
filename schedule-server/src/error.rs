//! Store error types.
//!
//! Every store operation reports one of four kinds. Low-level database
//! messages are kept as detail but the kind is always the primary signal.

use sqlx::error::ErrorKind;

/// Errors from schedule store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required field is blank or out of range. Raised before any store access.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The lookup, update or delete matched no rows.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness or referential constraint rejected the write.
    #[error("conflict: {message}")]
    Conflict { message: String, detail: String },

    /// Anything else, including driver and connection failures.
    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: sqlx::Error,
    },
}

impl StoreError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(message: impl Into<String>) -> Self {
        StoreError::NotFound(message.into())
    }

    /// Low-level diagnostic detail, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            StoreError::Conflict { detail, .. } => Some(detail.clone()),
            StoreError::Internal { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }

    /// Classify a database error raised while `context`.
    pub fn classify(context: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return StoreError::NotFound(format!("{context}: no matching row"));
        }

        if let sqlx::Error::Database(db) = &err
            && is_constraint_violation(db.as_ref())
        {
            return StoreError::Conflict {
                message: format!("{context}: constraint violated"),
                detail: db.message().to_string(),
            };
        }

        StoreError::Internal {
            message: context.to_string(),
            source: err,
        }
    }

    /// Closure form of [`StoreError::classify`] for use with `map_err`.
    pub fn during(context: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
        move |err| StoreError::classify(context, err)
    }
}

/// Whether the database rejected a statement on an integrity constraint.
fn is_constraint_violation(db: &dyn sqlx::error::DatabaseError) -> bool {
    match db.kind() {
        ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation | ErrorKind::CheckViolation => {
            true
        }
        // SQLite reports some constraint failures only through the message
        _ => db.message().contains("constraint failed"),
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::classify("database operation failed", err)
    }
}
