//! Schema definitions and migration runner for PostgreSQL.
//!
//! Applied versions are recorded in `keyward_migrations`. Every
//! statement is `IF NOT EXISTS`, so a half-applied or repeated run leaves
//! existing rows untouched.

use sqlx::{Executor, PgConnection, PgPool};
use tracing::info;

use crate::error::{DbError, DbResult};

const MIGRATION_TABLE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS keyward_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

struct Migration {
    version: i32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// `deleted_at IS NULL` marks a live row. The unique indexes span deleted
// rows too, so a soft-deleted record keeps its key reserved.
const SCHEMA_V1: &str = "\
CREATE TABLE IF NOT EXISTS applications (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    external_id TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);
CREATE UNIQUE INDEX IF NOT EXISTS applications_external_id_key
    ON applications (external_id);
CREATE INDEX IF NOT EXISTS applications_deleted_at_idx
    ON applications (deleted_at);

CREATE TABLE IF NOT EXISTS roles (
    id UUID PRIMARY KEY,
    app_id UUID NOT NULL REFERENCES applications (id),
    name VARCHAR(25) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    tag TEXT NOT NULL,
    permission JSONB NOT NULL DEFAULT '{\"config\": []}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);
CREATE UNIQUE INDEX IF NOT EXISTS roles_tag_key ON roles (tag);
CREATE INDEX IF NOT EXISTS roles_app_id_idx ON roles (app_id);
CREATE INDEX IF NOT EXISTS roles_deleted_at_idx ON roles (deleted_at);
";

/// Apply every migration newer than the recorded version.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::raw_sql(MIGRATION_TABLE_DDL)
        .execute(pool)
        .await
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM keyward_migrations")
        .fetch_one(pool)
        .await?;
    let current_version = current.unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }
        info!(
            version = migration.version,
            name = migration.name,
            "Applying relational migration"
        );

        let mut tx = pool.begin().await?;
        let conn: &mut PgConnection = &mut tx;
        Executor::execute(&mut *conn, migration.sql)
            .await
            .map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;
        sqlx::query(
            "INSERT INTO keyward_migrations (version, name) VALUES ($1, $2) \
             ON CONFLICT (version) DO NOTHING",
        )
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *conn)
        .await?;
        tx.commit().await?;
    }

    Ok(())
}
