//! PostgreSQL-backed implementation of the repository contract.
//!
//! # Data model
//! One table per entity. `deleted_at` is the soft-delete marker and every
//! read issued from this module filters on `deleted_at IS NULL`; callers
//! never add that predicate themselves.
//!
//! # Concurrency
//! The store is shared across async handlers; `sqlx::PgPool` hands each
//! call its own pooled connection. Nothing is retried: a failed statement
//! surfaces immediately.
//!
//! # Security notes
//! The configuration carries credentials; they are never logged.

mod application;
mod role;
pub mod schema;

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tracing::info;

pub use application::RelationalApplicationRepository;
pub use role::RelationalRoleRepository;

use crate::error::DbResult;

/// Connection settings for PostgreSQL.
#[derive(Debug, Clone)]
pub struct RelationalConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Session time zone applied to every pooled connection.
    pub timezone: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5432,
            username: "postgres".into(),
            password: "postgres".into(),
            database: "keyward".into(),
            timezone: "UTC".into(),
            max_connections: 10,
            acquire_timeout_ms: 5_000,
        }
    }
}

impl RelationalConfig {
    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
            .options([("timezone", self.timezone.as_str())])
    }
}

/// Handle over a PostgreSQL pool; repositories are created from it.
#[derive(Clone)]
pub struct RelationalStore {
    pool: PgPool,
}

impl RelationalStore {
    pub async fn connect(config: &RelationalConfig) -> DbResult<Self> {
        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect_with(config.connect_options())
            .await?;

        info!("Successfully connected to PostgreSQL");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn applications(&self) -> RelationalApplicationRepository {
        RelationalApplicationRepository::new(self.pool.clone())
    }

    pub fn roles(&self) -> RelationalRoleRepository {
        RelationalRoleRepository::new(self.pool.clone())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_options_carry_timezone() {
        let config = RelationalConfig {
            timezone: "America/Sao_Paulo".into(),
            ..Default::default()
        };
        let options = config.connect_options();
        assert_eq!(options.get_host(), "127.0.0.1");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_database(), Some("keyward"));
        assert!(
            options
                .get_options()
                .is_some_and(|o| o.contains("America/Sao_Paulo"))
        );
    }
}
