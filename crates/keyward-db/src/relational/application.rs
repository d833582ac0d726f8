//! PostgreSQL implementation of [`ApplicationRepository`].

use chrono::{DateTime, Utc};
use keyward_core::error::KeywardResult;
use keyward_core::models::application::{Application, ApplicationFilter, CreateApplication};
use keyward_core::repository::{ApplicationRepository, require_identifier};
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::schema;
use crate::error::{DbError, classify_sqlx};

const ENTITY: &str = "application";

/// Row shape for the `applications` table.
#[derive(Debug, FromRow)]
pub(super) struct ApplicationRow {
    id: Uuid,
    name: String,
    external_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Application {
            id: row.id,
            name: row.name,
            external_id: row.external_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn write_error(err: sqlx::Error) -> DbError {
    let err = classify_sqlx(err, ENTITY);
    match &err {
        DbError::Duplicate { .. } => warn!("Application external_id already taken"),
        other => error!(error = %other, "Failed to write application"),
    }
    err
}

/// PostgreSQL implementation of the Application repository.
#[derive(Clone)]
pub struct RelationalApplicationRepository {
    pool: PgPool,
}

impl RelationalApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Raw `deleted_at` of the row, live or not. The outer `None` means no
    /// row exists at all.
    pub async fn deleted_at(&self, id: Uuid) -> KeywardResult<Option<Option<DateTime<Utc>>>> {
        let marker: Option<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT deleted_at FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::from)?;
        Ok(marker)
    }
}

impl ApplicationRepository for RelationalApplicationRepository {
    async fn ensure_schema(&self) -> KeywardResult<()> {
        schema::run_migrations(&self.pool).await?;
        Ok(())
    }

    async fn list(&self, filter: ApplicationFilter) -> KeywardResult<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT id, name, external_id, created_at, updated_at \
             FROM applications \
             WHERE deleted_at IS NULL \
               AND ($1::text IS NULL OR external_id = $1) \
             ORDER BY created_at ASC",
        )
        .bind(filter.external_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(Application::from).collect())
    }

    async fn get(&self, id: Uuid) -> KeywardResult<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            "SELECT id, name, external_id, created_at, updated_at \
             FROM applications \
             WHERE id = $1 AND deleted_at IS NULL",
        )
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

    async fn create(&self, input: CreateApplication) -> KeywardResult<Uuid> {
        input.validate()?;

        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO applications (id, name, external_id) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&input.name)
            .bind(&input.external_id)
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        debug!(%id, "Created application");
        Ok(id)
    }

    async fn update(&self, app: Application) -> KeywardResult<()> {
        let id = require_identifier(app.id)?;
        CreateApplication {
            name: app.name.clone(),
            external_id: app.external_id.clone(),
        }
        .validate()?;

        let result = sqlx::query(
            "UPDATE applications \
             SET name = $2, external_id = $3, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(&app.name)
        .bind(&app.external_id)
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
            "UPDATE applications \
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
        debug!(%id, "Soft-deleted application");
        Ok(())
    }
}
