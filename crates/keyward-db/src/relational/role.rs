//! PostgreSQL implementation of [`RoleRepository`].
//!
//! The permission set lives in a `JSONB` column and is (de)serialized
//! through `sqlx::types::Json`.

use chrono::{DateTime, Utc};
use keyward_core::error::KeywardResult;
use keyward_core::models::application::Application;
use keyward_core::models::permission::Permission;
use keyward_core::models::role::{CreateRole, Role};
use keyward_core::repository::{RoleRepository, require_identifier};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::application::ApplicationRow;
use crate::error::{DbError, classify_sqlx};

const ENTITY: &str = "role";

const ROLE_COLUMNS: &str =
    "id, app_id, name, description, tag, permission, created_at, updated_at";

/// Row shape for the `roles` table.
#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    app_id: Uuid,
    name: String,
    description: String,
    tag: String,
    permission: Json<Permission>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.id,
            application_id: row.app_id,
            name: row.name,
            description: row.description,
            tag: row.tag,
            permission: row.permission.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn write_error(err: sqlx::Error) -> DbError {
    let err = classify_sqlx(err, ENTITY);
    match &err {
        DbError::Duplicate { .. } => warn!("Role tag already taken"),
        other => error!(error = %other, "Failed to write role"),
    }
    err
}

/// PostgreSQL implementation of the Role repository.
#[derive(Clone)]
pub struct RelationalRoleRepository {
    pool: PgPool,
}

impl RelationalRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Raw `deleted_at` of the row, live or not. The outer `None` means no
    /// row exists at all.
    pub async fn deleted_at(&self, id: Uuid) -> KeywardResult<Option<Option<DateTime<Utc>>>> {
        let marker: Option<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT deleted_at FROM roles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::from)?;
        Ok(marker)
    }
}

impl RoleRepository for RelationalRoleRepository {
    async fn create(&self, input: CreateRole) -> KeywardResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO roles (id, app_id, name, description, tag, permission) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(input.application_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.tag)
        .bind(Json(&input.permission))
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        debug!(%id, tag = %input.tag, "Created role");
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> KeywardResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id.to_string(),
        })?;

        Ok(row.into())
    }

    async fn get_owning_application(&self, id: Uuid) -> KeywardResult<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            "SELECT a.id, a.name, a.external_id, a.created_at, a.updated_at \
             FROM roles r \
             JOIN applications a ON a.id = r.app_id \
             WHERE r.id = $1 \
               AND r.deleted_at IS NULL \
               AND a.deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DbError::NotFound {
            entity: "application".into(),
            id: format!("owner of role {id}"),
        })?;

        Ok(row.into())
    }

    async fn list_by_application(&self, application_id: Uuid) -> KeywardResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles \
             WHERE app_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at ASC"
        ))
        .bind(application_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn update(&self, role: Role) -> KeywardResult<()> {
        let id = require_identifier(role.id)?;

        let result = sqlx::query(
            "UPDATE roles \
             SET app_id = $2, name = $3, description = $4, tag = $5, \
                 permission = $6, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(role.application_id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(&role.tag)
        .bind(Json(&role.permission))
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                entity: ENTITY.into(),
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> KeywardResult<()> {
        let id = require_identifier(id)?;

        let result = sqlx::query(
            "UPDATE roles \
             SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                entity: ENTITY.into(),
                id: id.to_string(),
            }
            .into());
        }
        debug!(%id, "Soft-deleted role");
        Ok(())
    }
}
