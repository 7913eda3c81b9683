//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. An unset customer domain is `NONE`,
//! which unique indexes do not count as a value.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Customers (tenants)
-- =======================================================================
DEFINE TABLE customer SCHEMAFULL;
DEFINE FIELD full_name ON TABLE customer TYPE string;
DEFINE FIELD email ON TABLE customer TYPE string;
DEFINE FIELD password_hash ON TABLE customer TYPE string;
DEFINE FIELD domain ON TABLE customer TYPE option<string>;
DEFINE FIELD status ON TABLE customer TYPE string \
    ASSERT $value IN ['pending', 'trial', 'paid'];
DEFINE FIELD created_at ON TABLE customer TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE customer TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_customer_email ON TABLE customer \
    COLUMNS email UNIQUE;
DEFINE INDEX idx_customer_domain ON TABLE customer \
    COLUMNS domain UNIQUE;

-- =======================================================================
-- Invitations (customer scope)
-- =======================================================================
DEFINE TABLE invitation SCHEMAFULL;
DEFINE FIELD customer_id ON TABLE invitation TYPE string;
DEFINE FIELD slug ON TABLE invitation TYPE string;
DEFINE FIELD title ON TABLE invitation TYPE string;
DEFINE FIELD search_name ON TABLE invitation TYPE string;
DEFINE FIELD event_date ON TABLE invitation TYPE option<datetime>;
DEFINE FIELD theme_key ON TABLE invitation TYPE string;
DEFINE FIELD is_published ON TABLE invitation TYPE bool DEFAULT false;
DEFINE FIELD content ON TABLE invitation TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE invitation TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE invitation TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_invitation_customer_slug ON TABLE invitation \
    COLUMNS customer_id, slug UNIQUE;

-- =======================================================================
-- Admin users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Refresh sessions (admin users)
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE session TYPE option<string>;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD revoked_at ON TABLE session TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token_hash ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_user ON TABLE session COLUMNS user_id;
";

/// Apply all pending migrations in version order.
///
/// Safe to call on every startup: applied versions are recorded in
/// `_migration` and skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("migration table: {e}")))?;

    let mut result = db.query("SELECT version FROM _migration").await?;
    let applied: Vec<MigrationRecord> = result.take(0)?;

    for migration in MIGRATIONS {
        if applied.iter().any(|m| m.version == migration.version) {
            continue;
        }

        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        // Record the applied migration.
        db.query(
            "CREATE _migration SET version = $version, \
             name = $name",
        )
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "Failed to record migration v{}: {}",
                migration.version, e,
            ))
        })?;

        info!(
            version = migration.version,
            "Migration applied successfully"
        );
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
