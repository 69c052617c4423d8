//! Database-specific error types and conversions.

use studyhub_core::error::StudyError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt record: {0}")]
    Decode(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for StudyError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StudyError::NotFound { entity, id },
            DbError::Hash(msg) => StudyError::Crypto(msg),
            other => StudyError::Database(other.to_string()),
        }
    }
}

/// Parse a UUID stored as a string column.
pub(crate) fn parse_uuid(field: &str, raw: &str) -> Result<uuid::Uuid, DbError> {
    uuid::Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

/// Parse a list of UUIDs stored as a string array.
pub(crate) fn parse_uuids(field: &str, raw: &[String]) -> Result<Vec<uuid::Uuid>, DbError> {
    raw.iter().map(|s| parse_uuid(field, s)).collect()
}

pub(crate) fn uuid_strings(ids: &[uuid::Uuid]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}
