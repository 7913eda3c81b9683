//! SurrealDB implementation of [`SessionRepository`].
//!
//! Expiry is always compared against a caller-supplied instant rather
//! than `time::now()`, so the auth service's clock stays authoritative.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use undangan_core::error::UndanganResult;
use undangan_core::models::session::{CreateSession, Session};
use undangan_core::repository::SessionRepository;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct SessionRow {
    user_id: String,
    token_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    user_id: String,
    token_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

/// Projection used only to count the rows a write touched.
#[derive(Debug, SurrealValue)]
#[allow(dead_code)]
struct AffectedRow {
    token_hash: String,
}

fn row_to_session(row: SessionRow, id: Uuid) -> Result<Session, DbError> {
    Ok(Session {
        id,
        user_id: parse_uuid(&row.user_id, "user")?,
        token_hash: row.token_hash,
        ip_address: row.ip_address,
        user_agent: row.user_agent,
        expires_at: row.expires_at,
        revoked_at: row.revoked_at,
        created_at: row.created_at,
    })
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<Session, DbError> {
        let id = parse_uuid(&self.record_id, "session")?;
        row_to_session(
            SessionRow {
                user_id: self.user_id,
                token_hash: self.token_hash,
                ip_address: self.ip_address,
                user_agent: self.user_agent,
                expires_at: self.expires_at,
                revoked_at: self.revoked_at,
                created_at: self.created_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> UndanganResult<Session> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 user_id = $user_id, \
                 token_hash = $token_hash, \
                 ip_address = $ip_address, \
                 user_agent = $user_agent, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id_str,
        })?;

        Ok(row_to_session(row, id)?)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> UndanganResult<Session> {
        let token_hash_owned = token_hash.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE token_hash = $token_hash LIMIT 1",
            )
            .bind(("token_hash", token_hash_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: format!("token_hash={token_hash_owned}"),
        })?;

        Ok(row.try_into_session()?)
    }

    async fn touch(&self, token_hash: &str, expires_at: DateTime<Utc>) -> UndanganResult<bool> {
        let mut result = self
            .db
            .query(
                "UPDATE session SET expires_at = $expires_at \
                 WHERE token_hash = $token_hash AND revoked_at = NONE",
            )
            .bind(("token_hash", token_hash.to_string()))
            .bind(("expires_at", expires_at))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AffectedRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn revoke(&self, token_hash: &str, at: DateTime<Utc>) -> UndanganResult<bool> {
        let mut result = self
            .db
            .query(
                "UPDATE session SET revoked_at = $at \
                 WHERE token_hash = $token_hash AND revoked_at = NONE",
            )
            .bind(("token_hash", token_hash.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AffectedRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn revoke_user_sessions(&self, user_id: Uuid, at: DateTime<Utc>) -> UndanganResult<u64> {
        let mut result = self
            .db
            .query(
                "UPDATE session SET revoked_at = $at \
                 WHERE user_id = $user_id AND revoked_at = NONE",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AffectedRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }

    async fn cleanup(&self, now: DateTime<Utc>) -> UndanganResult<u64> {
        let mut result = self
            .db
            .query(
                "DELETE session \
                 WHERE expires_at <= $now OR revoked_at != NONE \
                 RETURN BEFORE",
            )
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AffectedRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
