//! Application domain model.
//!
//! An application is the tenant-like parent that owns a set of roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{KeywardError, KeywardResult};
use crate::models::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Caller-supplied identifier, unique across the store.
    pub external_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplication {
    pub name: String,
    pub external_id: String,
}

impl CreateApplication {
    pub fn new(name: impl Into<String>, external_id: impl Into<String>) -> KeywardResult<Self> {
        let input = Self {
            name: name.into(),
            external_id: external_id.into(),
        };
        input.validate()?;
        Ok(input)
    }

    pub fn validate(&self) -> KeywardResult<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("external_id", &self.external_id)
    }
}

/// Filter for listing live applications.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub external_id: Option<String>,
}

impl ApplicationFilter {
    pub fn by_external_id(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
        }
    }
}

/// An application together with the live roles it owns.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationWithRoles {
    #[serde(flatten)]
    pub application: Application,
    pub roles: Vec<Role>,
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> KeywardResult<()> {
    if value.trim().is_empty() {
        return Err(KeywardError::Validation {
            message: format!("'{field}' must not be empty"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_external_id_is_rejected() {
        let err = CreateApplication::new("Service A", "  ").unwrap_err();
        assert!(matches!(err, KeywardError::Validation { .. }));
    }

    #[test]
    fn valid_input_passes() {
        let input = CreateApplication::new("Service A", "svc-a").unwrap();
        assert_eq!(input.external_id, "svc-a");
    }
}
