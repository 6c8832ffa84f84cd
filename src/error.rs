//! Error type returned by every store operation. Callers decide whether to
//! surface, retry, or ignore; the store itself never swallows a failure.

use rusqlite::{Error as SqlError, ErrorCode};
use thiserror::Error;

use crate::models::UNCATEGORIZED;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("{entity} \"{name}\" already exists.")]
    Duplicate { entity: &'static str, name: String },

    #[error("{entity} not found (id {id}).")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{entity} name cannot be empty.")]
    EmptyName { entity: &'static str },

    /// The name is the label shown for books without a category.
    #[error("\"{name}\" is reserved for books without a category.")]
    ReservedName { entity: &'static str, name: String },

    /// Another thread panicked while holding the connection.
    #[error("library store lock was poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(#[from] SqlError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

/// Coerce SQLite constraint errors into [`StoreError::Duplicate`]. Every
/// unique constraint in the schema guards a name column, so the offending
/// name is enough to build a readable message.
pub(crate) fn map_unique_constraint(err: SqlError, entity: &'static str, name: &str) -> StoreError {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        StoreError::Duplicate {
            entity,
            name: name.to_string(),
        }
    } else {
        err.into()
    }
}

/// Trim a user-supplied category/folder name and reject blank input.
pub(crate) fn normalize_name(raw: &str, entity: &'static str) -> StoreResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(StoreError::EmptyName { entity })
    } else {
        Ok(trimmed.to_string())
    }
}

/// [`normalize_name`] for category names, which additionally may not collide
/// with the uncategorized label.
pub(crate) fn normalize_category_name(raw: &str, entity: &'static str) -> StoreResult<String> {
    let name = normalize_name(raw, entity)?;
    if name.eq_ignore_ascii_case(UNCATEGORIZED) {
        return Err(StoreError::ReservedName { entity, name });
    }
    Ok(name)
}
