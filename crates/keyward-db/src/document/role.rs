//! SurrealDB implementation of [`RoleRepository`].
//!
//! The permission set is stored as a native nested object rather than a
//! serialized string, so it stays queryable inside the store.

use chrono::{DateTime, Utc};
use keyward_core::error::KeywardResult;
use keyward_core::models::application::Application;
use keyward_core::models::permission::Permission;
use keyward_core::models::role::{CreateRole, Role};
use keyward_core::repository::{ApplicationRepository, RoleRepository, require_identifier};
use serde_json::Value;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::application::DocumentApplicationRepository;
use super::codec::IdCodec;
use super::{active_flag, deactivate, decode_id};
use crate::error::{DbError, classify_surreal};

const TABLE: &str = "role";

#[derive(Debug, SurrealValue)]
struct RoleRow {
    uid: Value,
    app_id: Value,
    name: String,
    description: String,
    tag: String,
    permission: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn try_into_role(self, codec: &IdCodec) -> Result<Role, DbError> {
        let permission: Permission = serde_json::from_value(self.permission)
            .map_err(|e| DbError::Corrupt(format!("role.permission: {e}")))?;
        Ok(Role {
            id: decode_id(codec, "role.uid", &self.uid)?,
            application_id: decode_id(codec, "role.app_id", &self.app_id)?,
            name: self.name,
            description: self.description,
            tag: self.tag,
            permission,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn permission_document(permission: &Permission) -> Result<Value, DbError> {
    serde_json::to_value(permission).map_err(|e| DbError::Corrupt(format!("role.permission: {e}")))
}

fn write_error(err: surrealdb::Error) -> DbError {
    let err = classify_surreal(err, TABLE);
    match &err {
        DbError::Duplicate { .. } => warn!("Role tag already taken"),
        other => error!(error = %other, "Failed to write role"),
    }
    err
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct DocumentRoleRepository<C: Connection> {
    db: Surreal<C>,
    codec: IdCodec,
}

impl<C: Connection> DocumentRoleRepository<C> {
    pub(crate) fn new(db: Surreal<C>, codec: IdCodec) -> Self {
        Self { db, codec }
    }

    /// Raw `active` flag of the record, live or not. `None` if the record
    /// does not exist at all.
    pub async fn active_flag(&self, id: Uuid) -> KeywardResult<Option<bool>> {
        Ok(active_flag(&self.db, TABLE, id).await?)
    }
}

impl<C: Connection> RoleRepository for DocumentRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> KeywardResult<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.db
            .query(
                "CREATE type::record('role', $id) SET \
                 uid = $uid, app_id = $app_id, \
                 name = $name, description = $description, \
                 tag = $tag, permission = $permission, \
                 active = true, \
                 created_at = $now, updated_at = $now",
            )
            .bind(("id", id.to_string()))
            .bind(("uid", self.codec.encode(id)))
            .bind(("app_id", self.codec.encode(input.application_id)))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("tag", input.tag))
            .bind(("permission", permission_document(&input.permission)?))
            .bind(("now", now))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(write_error)?;

        debug!(%id, "Created role");
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> KeywardResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('role', $id) WHERE active = true")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: TABLE.into(),
            id: id_str,
        })?;

        Ok(row.try_into_role(&self.codec)?)
    }

    async fn get_owning_application(&self, id: Uuid) -> KeywardResult<Application> {
        let role = self.get(id).await?;
        DocumentApplicationRepository::new(self.db.clone(), self.codec)
            .get(role.application_id)
            .await
    }

    async fn list_by_application(&self, application_id: Uuid) -> KeywardResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM role \
                 WHERE app_id = $app_id AND active = true \
                 ORDER BY created_at ASC",
            )
            .bind(("app_id", self.codec.encode(application_id)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_role(&self.codec))
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(items)
    }

    async fn update(&self, role: Role) -> KeywardResult<()> {
        let id = require_identifier(role.id)?;

        let mut result = self
            .db
            .query(
                "UPDATE type::record('role', $id) SET \
                 app_id = $app_id, \
                 name = $name, description = $description, \
                 tag = $tag, permission = $permission, \
                 updated_at = $now \
                 WHERE active = true",
            )
            .bind(("id", id.to_string()))
            .bind(("app_id", self.codec.encode(role.application_id)))
            .bind(("name", role.name))
            .bind(("description", role.description))
            .bind(("tag", role.tag))
            .bind(("permission", permission_document(&role.permission)?))
            .bind(("now", Utc::now()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(write_error)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
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
        debug!(%id, "Soft-deleted role");
        Ok(())
    }
}
