//! Database-specific error types and conversions.

use undangan_core::error::UndanganError;

/// Unique indexes and the logical key each one protects.
const UNIQUE_INDEXES: &[(&str, &str, &str)] = &[
    ("idx_customer_email", "customer", "email"),
    ("idx_customer_domain", "customer", "domain"),
    ("idx_invitation_customer_slug", "invitation", "slug"),
    ("idx_user_email", "user", "email"),
    ("idx_session_token_hash", "session", "token_hash"),
];

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Unique constraint violated: {entity}.{key}")]
    Conflict { entity: String, key: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Corrupt row: {0}")]
    Decode(String),
}

impl DbError {
    /// Classify a failed statement. Unique-index violations become
    /// [`DbError::Conflict`], everything else [`DbError::Query`].
    pub(crate) fn from_statement(err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            if let Some((_, entity, key)) = UNIQUE_INDEXES
                .iter()
                .find(|(index, _, _)| message.contains(index))
            {
                return DbError::Conflict {
                    entity: (*entity).into(),
                    key: (*key).into(),
                };
            }
        }
        DbError::Query(message)
    }
}

impl From<DbError> for UndanganError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => UndanganError::NotFound { entity, id },
            DbError::Conflict { entity, key } => UndanganError::AlreadyExists { entity, key },
            other => UndanganError::Database(other.to_string()),
        }
    }
}

pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<uuid::Uuid, DbError> {
    uuid::Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}
