//! Repository trait definitions for data access abstraction.
//!
//! Every backend adapter implements these traits identically:
//!
//! - `get` and `list` only ever return live records.
//! - `create` fails with [`KeywardError::DuplicateKey`] when the unique
//!   key (`external_id` for applications, `tag` for roles) is taken, and
//!   with [`KeywardError::StorageFailure`] for anything else.
//! - `update` and `soft_delete` fail with
//!   [`KeywardError::InvalidIdentifier`] for the nil UUID.
//! - A lookup with no matching live record fails with
//!   [`KeywardError::NotFound`].
//!
//! [`KeywardError::DuplicateKey`]: crate::error::KeywardError::DuplicateKey
//! [`KeywardError::StorageFailure`]: crate::error::KeywardError::StorageFailure
//! [`KeywardError::InvalidIdentifier`]: crate::error::KeywardError::InvalidIdentifier
//! [`KeywardError::NotFound`]: crate::error::KeywardError::NotFound

use uuid::Uuid;

use crate::error::{KeywardError, KeywardResult};
use crate::models::{
    application::{Application, ApplicationFilter, CreateApplication},
    role::{CreateRole, Role},
};

pub trait ApplicationRepository: Send + Sync {
    /// Create missing tables, columns and indexes. Safe on every start.
    fn ensure_schema(&self) -> impl Future<Output = KeywardResult<()>> + Send;
    fn list(
        &self,
        filter: ApplicationFilter,
    ) -> impl Future<Output = KeywardResult<Vec<Application>>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = KeywardResult<Application>> + Send;
    /// Assigns the identifier and returns it.
    fn create(&self, input: CreateApplication) -> impl Future<Output = KeywardResult<Uuid>> + Send;
    /// Full replace of the mutable fields (`name`, `external_id`).
    fn update(&self, app: Application) -> impl Future<Output = KeywardResult<()>> + Send;
    /// Marks the application deleted. Roles are left untouched.
    fn soft_delete(&self, id: Uuid) -> impl Future<Output = KeywardResult<()>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = KeywardResult<Uuid>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = KeywardResult<Role>> + Send;
    /// Resolve the live application that owns the live role `id`.
    fn get_owning_application(
        &self,
        id: Uuid,
    ) -> impl Future<Output = KeywardResult<Application>> + Send;
    fn list_by_application(
        &self,
        application_id: Uuid,
    ) -> impl Future<Output = KeywardResult<Vec<Role>>> + Send;
    /// Full replace of the mutable fields, including the stored tag.
    fn update(&self, role: Role) -> impl Future<Output = KeywardResult<()>> + Send;
    fn soft_delete(&self, id: Uuid) -> impl Future<Output = KeywardResult<()>> + Send;
}

/// Rejects the nil UUID before any storage call is made.
pub fn require_identifier(id: Uuid) -> KeywardResult<Uuid> {
    if id.is_nil() {
        return Err(KeywardError::InvalidIdentifier);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_identifier_is_invalid() {
        assert!(matches!(
            require_identifier(Uuid::nil()),
            Err(KeywardError::InvalidIdentifier)
        ));
        let id = Uuid::new_v4();
        assert_eq!(require_identifier(id).unwrap(), id);
    }
}
