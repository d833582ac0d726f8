//! SurrealDB-backed implementation of the repository contract.
//!
//! [`DocumentStore::init`] is the single setup step: it brings the schema
//! and unique indexes up to date, builds the [`IdCodec`], and returns the
//! handle every document repository is created from. Nothing here is
//! mutated after that, so the handle can be cloned freely across tasks.

mod application;
pub mod codec;
mod role;
pub mod schema;

use chrono::{DateTime, Utc};
use serde_json::Value;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{error, info};
use uuid::Uuid;

pub use application::DocumentApplicationRepository;
pub use codec::{CodecError, IdCodec};
pub use role::DocumentRoleRepository;

use crate::error::{DbError, DbResult};

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    pub host: String,
    pub port: u16,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            namespace: "keyward".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DocumentConfig {
    /// WebSocket address, `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Ready-to-use document store handle.
#[derive(Clone)]
pub struct DocumentStore<C: Connection> {
    db: Surreal<C>,
    codec: IdCodec,
}

impl DocumentStore<Client> {
    /// Connect to SurrealDB over WebSocket, then [`init`](Self::init).
    pub async fn connect(config: &DocumentConfig) -> DbResult<Self> {
        info!(
            address = %config.address(),
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(config.address()).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Successfully connected to SurrealDB");

        Self::init(db).await
    }
}

impl<C: Connection> DocumentStore<C> {
    /// Prepare an already selected namespace/database for use.
    pub async fn init(db: Surreal<C>) -> DbResult<Self> {
        schema::ensure_schema(&db).await?;
        Ok(Self {
            db,
            codec: IdCodec::new(),
        })
    }

    pub fn applications(&self) -> DocumentApplicationRepository<C> {
        DocumentApplicationRepository::new(self.db.clone(), self.codec)
    }

    pub fn roles(&self) -> DocumentRoleRepository<C> {
        DocumentRoleRepository::new(self.db.clone(), self.codec)
    }

    pub fn codec(&self) -> IdCodec {
        self.codec
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }
}

/// Row struct for raw deletion-marker reads.
#[derive(Debug, SurrealValue)]
struct ActiveRow {
    active: bool,
}

/// Read the `active` flag of `table:id` regardless of liveness.
async fn active_flag<C: Connection>(
    db: &Surreal<C>,
    table: &str,
    id: Uuid,
) -> DbResult<Option<bool>> {
    let mut result = db
        .query("SELECT active FROM type::record($table, $id)")
        .bind(("table", table.to_string()))
        .bind(("id", id.to_string()))
        .await?;
    let rows: Vec<ActiveRow> = result.take(0)?;
    Ok(rows.first().map(|row| row.active))
}

/// Flip `active` to false on a live `table:id`.
async fn deactivate<C: Connection>(
    db: &Surreal<C>,
    table: &str,
    id: Uuid,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let mut result = db
        .query(
            "UPDATE type::record($table, $id) SET active = false, \
             updated_at = $now WHERE active = true",
        )
        .bind(("table", table.to_string()))
        .bind(("id", id.to_string()))
        .bind(("now", now))
        .await?
        .check()?;
    let rows: Vec<ActiveRow> = result.take(0)?;
    if rows.is_empty() {
        return Err(DbError::NotFound {
            entity: table.into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Decode a stored identifier envelope, naming the field on failure.
fn decode_id(codec: &IdCodec, field: &str, value: &Value) -> DbResult<Uuid> {
    codec.decode(value).map_err(|e| {
        error!(field, error = %e, "Stored identifier failed to decode");
        DbError::Codec(e)
    })
}

#[cfg(test)]
mod tests {
    use surrealdb::engine::local::Mem;

    use super::*;

    #[tokio::test]
    async fn deactivate_flips_flag_once() {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        let store = DocumentStore::init(db).await.unwrap();
        let id = Uuid::new_v4();

        assert_eq!(active_flag(store.client(), "application", id).await.unwrap(), None);

        store
            .client()
            .query(
                "CREATE type::record('application', $id) SET uid = $uid, \
                 name = 'Service A', external_id = 'svc-a', active = true, \
                 created_at = $now, updated_at = $now",
            )
            .bind(("id", id.to_string()))
            .bind(("uid", store.codec().encode(id)))
            .bind(("now", Utc::now()))
            .await
            .unwrap()
            .check()
            .unwrap();
        assert_eq!(
            active_flag(store.client(), "application", id).await.unwrap(),
            Some(true)
        );

        deactivate(store.client(), "application", id, Utc::now())
            .await
            .unwrap();
        assert_eq!(
            active_flag(store.client(), "application", id).await.unwrap(),
            Some(false)
        );
        assert!(matches!(
            deactivate(store.client(), "application", id, Utc::now()).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
