//! Process configuration, read from the environment.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use keyward_db::{DocumentConfig, RelationalConfig};

/// Which storage backend this process serves from.
#[derive(Debug, Clone)]
pub enum Backend {
    Postgres(RelationalConfig),
    Surreal(DocumentConfig),
}

#[derive(Debug, Clone)]
pub struct KeywardConfig {
    pub backend: Backend,
    /// Upper bound on connecting and preparing the schema at startup.
    pub startup_timeout: Duration,
}

impl KeywardConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to the adapter
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = match lookup("KEYWARD_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" | "pg" => Backend::Postgres(relational(&lookup)?),
            "surreal" | "surrealdb" => Backend::Surreal(document(&lookup)?),
            other => bail!("unknown KEYWARD_BACKEND `{other}`, expected `postgres` or `surreal`"),
        };
        let startup_timeout = match lookup("KEYWARD_STARTUP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .with_context(|| "parse KEYWARD_STARTUP_TIMEOUT_SECS")?,
            ),
            None => Duration::from_secs(30),
        };
        Ok(Self {
            backend,
            startup_timeout,
        })
    }
}

fn relational(lookup: &impl Fn(&str) -> Option<String>) -> Result<RelationalConfig> {
    let defaults = RelationalConfig::default();
    Ok(RelationalConfig {
        host: lookup("KEYWARD_PG_HOST").unwrap_or(defaults.host),
        port: parse_or(lookup, "KEYWARD_PG_PORT", defaults.port)?,
        username: lookup("KEYWARD_PG_USER").unwrap_or(defaults.username),
        password: lookup("KEYWARD_PG_PASSWORD").unwrap_or(defaults.password),
        database: lookup("KEYWARD_PG_DATABASE").unwrap_or(defaults.database),
        timezone: lookup("KEYWARD_PG_TIMEZONE").unwrap_or(defaults.timezone),
        max_connections: parse_or(lookup, "KEYWARD_PG_MAX_CONNECTIONS", defaults.max_connections)?,
        acquire_timeout_ms: parse_or(
            lookup,
            "KEYWARD_PG_ACQUIRE_TIMEOUT_MS",
            defaults.acquire_timeout_ms,
        )?,
    })
}

fn document(lookup: &impl Fn(&str) -> Option<String>) -> Result<DocumentConfig> {
    let defaults = DocumentConfig::default();
    Ok(DocumentConfig {
        host: lookup("KEYWARD_SURREAL_HOST").unwrap_or(defaults.host),
        port: parse_or(lookup, "KEYWARD_SURREAL_PORT", defaults.port)?,
        namespace: lookup("KEYWARD_SURREAL_NAMESPACE").unwrap_or(defaults.namespace),
        database: lookup("KEYWARD_SURREAL_DATABASE").unwrap_or(defaults.database),
        username: lookup("KEYWARD_SURREAL_USER").unwrap_or(defaults.username),
        password: lookup("KEYWARD_SURREAL_PASSWORD").unwrap_or(defaults.password),
    })
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.parse().with_context(|| format!("parse {key}")),
        None => Ok(default),
    }
}
