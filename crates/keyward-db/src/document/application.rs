//! SurrealDB implementation of [`ApplicationRepository`].

use chrono::{DateTime, Utc};
use keyward_core::error::KeywardResult;
use keyward_core::models::application::{Application, ApplicationFilter, CreateApplication};
use keyward_core::repository::{ApplicationRepository, require_identifier};
use serde_json::Value;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::codec::IdCodec;
use super::{active_flag, deactivate, decode_id, schema};
use crate::error::{DbError, classify_surreal};

const TABLE: &str = "application";

#[derive(Debug, SurrealValue)]
struct ApplicationRow {
    uid: Value,
    name: String,
    external_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ApplicationRow {
    fn try_into_application(self, codec: &IdCodec) -> Result<Application, DbError> {
        Ok(Application {
            id: decode_id(codec, "application.uid", &self.uid)?,
            name: self.name,
            external_id: self.external_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Application repository.
#[derive(Clone)]
pub struct DocumentApplicationRepository<C: Connection> {
    db: Surreal<C>,
    codec: IdCodec,
}

impl<C: Connection> DocumentApplicationRepository<C> {
    pub(crate) fn new(db: Surreal<C>, codec: IdCodec) -> Self {
        Self { db, codec }
    }

    /// Raw `active` flag of the record, live or not. `None` if the record
    /// does not exist at all.
    pub async fn active_flag(&self, id: Uuid) -> KeywardResult<Option<bool>> {
        Ok(active_flag(&self.db, TABLE, id).await?)
    }
}

fn write_error(err: surrealdb::Error) -> DbError {
    let err = classify_surreal(err, TABLE);
    match &err {
        DbError::Duplicate { .. } => warn!("Application external_id already taken"),
        other => error!(error = %other, "Failed to write application"),
    }
    err
}

impl<C: Connection> ApplicationRepository for DocumentApplicationRepository<C> {
    async fn ensure_schema(&self) -> KeywardResult<()> {
        schema::ensure_schema(&self.db).await?;
        Ok(())
    }

    async fn list(&self, filter: ApplicationFilter) -> KeywardResult<Vec<Application>> {
        let mut query = String::from("SELECT * FROM application WHERE active = true");
        if filter.external_id.is_some() {
            query.push_str(" AND external_id = $external_id");
        }
        query.push_str(" ORDER BY created_at ASC");

        let mut builder = self.db.query(&query);
        if let Some(external_id) = filter.external_id {
            builder = builder.bind(("external_id", external_id));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_application(&self.codec))
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(items)
    }

    async fn get(&self, id: Uuid) -> KeywardResult<Application> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('application', $id) WHERE active = true")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: TABLE.into(),
            id: id_str,
        })?;

        Ok(row.try_into_application(&self.codec)?)
    }

    async fn create(&self, input: CreateApplication) -> KeywardResult<Uuid> {
        input.validate()?;

        // Identifier and timestamps are assigned here, not by the store.
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.db
            .query(
                "CREATE type::record('application', $id) SET \
                 uid = $uid, \
                 name = $name, external_id = $external_id, \
                 active = true, \
                 created_at = $now, updated_at = $now",
            )
            .bind(("id", id.to_string()))
            .bind(("uid", self.codec.encode(id)))
            .bind(("name", input.name))
            .bind(("external_id", input.external_id))
            .bind(("now", now))
            .await
            .map_err(DbError::from)?
            .check()
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

        let mut result = self
            .db
            .query(
                "UPDATE type::record('application', $id) SET \
                 name = $name, external_id = $external_id, \
                 updated_at = $now \
                 WHERE active = true",
            )
            .bind(("id", id.to_string()))
            .bind(("name", app.name))
            .bind(("external_id", app.external_id))
            .bind(("now", Utc::now()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(write_error)?;

        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: TABLE.into(),
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> KeywardResult<()> {
        let id = require_identifier(id)?;
        deactivate(&self.db, TABLE, id, Utc::now()).await?;
        debug!(%id, "Soft-deleted application");
        Ok(())
    }
}
