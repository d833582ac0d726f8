//! Database-specific error types and conversions.
//!
//! Duplicate detection prefers a structured signal. PostgreSQL reports a
//! unique violation as SQLSTATE `23505`; SurrealDB exposes no such code,
//! so its unique-index failures are recognised by message text. The text
//! match is a fallback and depends on driver wording.

use keyward_core::error::KeywardError;

use crate::document::codec::CodecError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("PostgreSQL error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Identifier codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Duplicate {entity}")]
    Duplicate { entity: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for KeywardError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => KeywardError::NotFound { entity, id },
            DbError::Duplicate { entity } => KeywardError::DuplicateKey { entity },
            other => KeywardError::StorageFailure(other.to_string()),
        }
    }
}

/// Whether a driver message reads like a uniqueness violation.
pub(crate) fn looks_like_duplicate(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("duplicate") || message.contains("already contains")
}

/// Classify a failed PostgreSQL write against `entity`.
pub(crate) fn classify_sqlx(err: sqlx::Error, entity: &str) -> DbError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return DbError::Duplicate {
                    entity: entity.into(),
                };
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return DbError::NotFound {
                    entity: "application".into(),
                    id: "referenced by role".into(),
                };
            }
            _ => {}
        }
    }
    if looks_like_duplicate(&err.to_string()) {
        return DbError::Duplicate {
            entity: entity.into(),
        };
    }
    DbError::Sqlx(err)
}

/// Classify a failed SurrealDB statement against `entity`.
pub(crate) fn classify_surreal(err: surrealdb::Error, entity: &str) -> DbError {
    if looks_like_duplicate(&err.to_string()) {
        return DbError::Duplicate {
            entity: entity.into(),
        };
    }
    DbError::Surreal(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_text_signatures() {
        assert!(looks_like_duplicate(
            "duplicate key value violates unique constraint \"roles_tag_key\""
        ));
        assert!(looks_like_duplicate(
            "Database index `idx_application_external_id` already contains 'svc-a'"
        ));
        assert!(looks_like_duplicate("E11000 Duplicate key error"));
        assert!(!looks_like_duplicate("connection reset by peer"));
    }

    #[test]
    fn non_database_errors_are_storage_failures() {
        let err = classify_sqlx(sqlx::Error::PoolTimedOut, "application");
        assert!(matches!(err, DbError::Sqlx(_)));
        assert!(matches!(
            KeywardError::from(err),
            KeywardError::StorageFailure(_)
        ));
    }

    #[test]
    fn duplicate_maps_to_duplicate_key() {
        let err = DbError::Duplicate {
            entity: "role".into(),
        };
        assert!(matches!(
            KeywardError::from(err),
            KeywardError::DuplicateKey { entity } if entity == "role"
        ));
    }
}
