//! Mapping from sqlx errors to [`AppError`].

use stashbox_core::error::{AppError, ErrorKind};

/// SQLSTATE raised when `statement_timeout` cancels a query.
const QUERY_CANCELED: &str = "57014";

/// Unique index over `(owner_id, parent_id, lower(name))`.
pub const FOLDER_NAME_CONSTRAINT: &str = "folders_owner_parent_name_key";
/// Unique index over `lower(email)`.
pub const USER_EMAIL_CONSTRAINT: &str = "users_email_lower_key";
/// Unique constraint on share tokens.
pub const SHARE_TOKEN_CONSTRAINT: &str = "shared_links_token_key";

/// Map a sqlx error, turning timeouts into `ServiceUnavailable`.
pub fn db_error(context: &str, err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::PoolTimedOut => AppError::with_source(
            ErrorKind::ServiceUnavailable,
            "Timed out waiting for a database connection",
            err,
        ),
        sqlx::Error::Database(db) if db.code().as_deref() == Some(QUERY_CANCELED) => {
            AppError::with_source(
                ErrorKind::ServiceUnavailable,
                format!("{context}: statement timed out"),
                err,
            )
        }
        _ => AppError::with_source(ErrorKind::Database, context.to_string(), err),
    }
}

/// Conflict raised when deleting a folder would move `child` next to a
/// root folder of the same name.
pub fn reparent_conflict(child: &str) -> AppError {
    AppError::conflict(format!(
        "Subfolder '{child}' clashes with an existing root folder; rename it before deleting its parent"
    ))
}

/// Whether the error is a violation of the named unique constraint.
pub fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}
