//! Role domain model.
//!
//! A role belongs to exactly one application. Its `tag` is never chosen
//! by the caller: it is derived as `{external_id}/{name}` from the owning
//! application, and the storage backend keeps it unique.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{KeywardError, KeywardResult};
use crate::models::application::Application;
use crate::models::permission::Permission;

/// Longest role name the relational schema can hold.
pub const MAX_ROLE_NAME_LEN: usize = 25;

/// Characters allowed to separate words in a role name.
pub const ROLE_NAME_SEPARATORS: [char; 3] = ['/', '_', '-'];

static ALPHANUMERIC: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new("^[A-Za-z0-9]*$"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    /// Owning application.
    pub application_id: Uuid,
    pub name: String,
    pub description: String,
    pub tag: String,
    pub permission: Permission,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A role as submitted by a caller, before validation and tag derivation.
///
/// A missing `application_id` deserializes to the nil UUID, which the
/// provisioning pipeline rejects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRole {
    #[serde(default)]
    pub application_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permission: Permission,
}

/// Fields persisted when a role is created. Built from a validated
/// [`NewRole`] and its resolved owning [`Application`].
#[derive(Debug, Clone)]
pub struct CreateRole {
    pub application_id: Uuid,
    pub name: String,
    pub description: String,
    pub tag: String,
    pub permission: Permission,
}

impl CreateRole {
    pub fn for_application(app: &Application, input: NewRole) -> Self {
        Self {
            application_id: app.id,
            tag: derive_tag(app, &input.name),
            name: input.name,
            description: input.description,
            permission: input.permission,
        }
    }
}

/// `{application.external_id}/{role name}`, using the name as given.
pub fn derive_tag(app: &Application, role_name: &str) -> String {
    format!("{}/{}", app.external_id, role_name)
}

/// Checks a role name against the naming rules.
///
/// Whitespace is rejected outright. The separators `/`, `_` and `-` are
/// then stripped and whatever remains must be ASCII alphanumeric.
pub fn validate_role_name(name: &str) -> KeywardResult<()> {
    if name.chars().any(char::is_whitespace) {
        return Err(KeywardError::InvalidRoleName {
            reason: "white spaces not allowed in role name".into(),
        });
    }
    if name.chars().count() > MAX_ROLE_NAME_LEN {
        return Err(KeywardError::InvalidRoleName {
            reason: format!("role name longer than {MAX_ROLE_NAME_LEN} characters"),
        });
    }

    let stripped: String = name
        .chars()
        .filter(|c| !ROLE_NAME_SEPARATORS.contains(c))
        .collect();

    let matched = match ALPHANUMERIC.as_ref() {
        Ok(re) => re.is_match(&stripped),
        Err(_) => false,
    };
    if !matched {
        return Err(KeywardError::InvalidRoleName {
            reason: "use only alphanumeric in role name, to separate strings use /, - or _".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(external_id: &str) -> Application {
        Application {
            id: Uuid::new_v4(),
            name: "Service A".into(),
            external_id: external_id.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn separators_are_allowed() {
        for name in ["admin", "admin/read", "orders_rw", "read-only", "v2/a_b-c"] {
            assert!(validate_role_name(name).is_ok(), "{name} should pass");
        }
    }

    #[test]
    fn whitespace_is_rejected() {
        for name in ["admin read", "admin\tread", " admin"] {
            let err = validate_role_name(name).unwrap_err();
            assert!(matches!(err, KeywardError::InvalidRoleName { .. }));
        }
    }

    #[test]
    fn punctuation_is_rejected() {
        for name in ["admin.read", "admin:*", "rôle", "a+b"] {
            let err = validate_role_name(name).unwrap_err();
            assert!(
                matches!(err, KeywardError::InvalidRoleName { .. }),
                "{name} should fail"
            );
        }
    }

    #[test]
    fn overlong_name_is_rejected() {
        let name = "a".repeat(MAX_ROLE_NAME_LEN + 1);
        assert!(validate_role_name(&name).is_err());
        assert!(validate_role_name(&"a".repeat(MAX_ROLE_NAME_LEN)).is_ok());
    }

    // A name made only of separators strips to "" and currently passes the
    // character check. Whether it should be rejected as empty is undecided,
    // so no test pins that behaviour.

    #[test]
    fn tag_uses_unstripped_name() {
        let owner = app("svc-a");
        assert_eq!(derive_tag(&owner, "admin/read"), "svc-a/admin/read");

        let input = CreateRole::for_application(
            &owner,
            NewRole {
                application_id: owner.id,
                name: "ops_team".into(),
                ..Default::default()
            },
        );
        assert_eq!(input.tag, "svc-a/ops_team");
        assert_eq!(input.application_id, owner.id);
    }

    #[test]
    fn missing_application_id_deserializes_to_nil() {
        let role: NewRole = serde_json::from_str(r#"{"name":"admin"}"#).unwrap();
        assert!(role.application_id.is_nil());
    }
}
