//! Schema definitions and migration runner for the document store.
//!
//! Tables are SCHEMAFULL. Identifiers are stored through the
//! [`IdCodec`](super::codec::IdCodec) envelope, the deletion marker is an
//! explicit `active` flag, and the permission set is a native nested
//! object.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};

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
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Applications
-- =======================================================================
DEFINE TABLE IF NOT EXISTS application SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS uid ON TABLE application TYPE object FLEXIBLE;
DEFINE FIELD IF NOT EXISTS name ON TABLE application TYPE string;
DEFINE FIELD IF NOT EXISTS external_id ON TABLE application TYPE string;
DEFINE FIELD IF NOT EXISTS active ON TABLE application TYPE bool \
    DEFAULT true;
DEFINE FIELD IF NOT EXISTS created_at ON TABLE application TYPE datetime;
DEFINE FIELD IF NOT EXISTS updated_at ON TABLE application TYPE datetime;
DEFINE INDEX IF NOT EXISTS idx_application_active ON TABLE application \
    COLUMNS active;

-- =======================================================================
-- Roles (scoped to an application)
-- =======================================================================
DEFINE TABLE IF NOT EXISTS role SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS uid ON TABLE role TYPE object FLEXIBLE;
DEFINE FIELD IF NOT EXISTS app_id ON TABLE role TYPE object FLEXIBLE;
DEFINE FIELD IF NOT EXISTS name ON TABLE role TYPE string;
DEFINE FIELD IF NOT EXISTS description ON TABLE role TYPE string;
DEFINE FIELD IF NOT EXISTS tag ON TABLE role TYPE string;
DEFINE FIELD IF NOT EXISTS permission ON TABLE role TYPE object FLEXIBLE;
DEFINE FIELD IF NOT EXISTS active ON TABLE role TYPE bool DEFAULT true;
DEFINE FIELD IF NOT EXISTS created_at ON TABLE role TYPE datetime;
DEFINE FIELD IF NOT EXISTS updated_at ON TABLE role TYPE datetime;
DEFINE INDEX IF NOT EXISTS idx_role_app ON TABLE role \
    COLUMNS app_id, active;
";

/// Unique indexes created explicitly at initialisation:
/// `(index, table, column)`.
const UNIQUE_INDEXES: &[(&str, &str, &str)] = &[
    ("idx_application_external_id", "application", "external_id"),
    ("idx_role_tag", "role", "tag"),
];

/// Run all pending migrations against the given SurrealDB instance.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> DbResult<()> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }
        info!(
            version = migration.version,
            name = migration.name,
            "Applying document-store migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
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
    }

    Ok(())
}

/// Define the unique indexes backing `external_id` and `tag` uniqueness.
///
/// Plain `DEFINE INDEX`: on a restart SurrealDB refuses the existing
/// definitions, which is logged and otherwise ignored. Every other failure
/// is swallowed the same way, and then the affected key is not enforced
/// as unique by the store.
pub async fn ensure_unique_indexes<C: Connection>(db: &Surreal<C>) {
    for (index, table, column) in UNIQUE_INDEXES {
        let ddl = format!("DEFINE INDEX {index} ON TABLE {table} COLUMNS {column} UNIQUE");
        match db.query(ddl).await.and_then(|response| response.check()) {
            Ok(_) => info!(index, table, column, "Created unique index"),
            Err(e) => warn!(index, table, error = %e, "Failed to create index"),
        }
    }
}

/// Migrations followed by the unique indexes. Idempotent.
pub async fn ensure_schema<C: Connection>(db: &Surreal<C>) -> DbResult<()> {
    run_migrations(db).await?;
    ensure_unique_indexes(db).await;
    Ok(())
}
