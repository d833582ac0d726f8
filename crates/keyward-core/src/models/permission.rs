//! Permission domain model.
//!
//! A permission is an ordered list of route configurations, each
//! mapping HTTP method names to an enabled flag. Adapters persist it
//! as a structured blob and must round-trip it without loss.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{KeywardError, KeywardResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default)]
    pub config: Vec<PermissionConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Route path the entry applies to (e.g. `/api/v1/orders`).
    pub path: String,
    /// HTTP method name (e.g. `GET`) to enabled flag.
    #[serde(default)]
    pub allowed_methods: BTreeMap<String, bool>,
}

impl PermissionConfig {
    pub fn new<I, M>(path: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = (M, bool)>,
        M: Into<String>,
    {
        Self {
            path: path.into(),
            allowed_methods: methods.into_iter().map(|(m, on)| (m.into(), on)).collect(),
        }
    }
}

impl Permission {
    pub fn new(config: Vec<PermissionConfig>) -> Self {
        Self { config }
    }

    /// Every entry needs a path; method names must be non-empty.
    pub fn validate(&self) -> KeywardResult<()> {
        for (idx, entry) in self.config.iter().enumerate() {
            if entry.path.trim().is_empty() {
                return Err(KeywardError::Validation {
                    message: format!("permission config #{idx} has an empty path"),
                });
            }
            if entry.allowed_methods.keys().any(|m| m.trim().is_empty()) {
                return Err(KeywardError::Validation {
                    message: format!("permission config #{idx} has an empty method name"),
                });
            }
        }
        Ok(())
    }
}
