//! Role provisioning: validation and tag derivation ahead of storage.

use keyward_core::error::{KeywardError, KeywardResult};
use keyward_core::models::application::Application;
use keyward_core::models::role::{CreateRole, NewRole, Role, derive_tag, validate_role_name};
use keyward_core::repository::{ApplicationRepository, RoleRepository, require_identifier};
use tracing::{debug, error, warn};
use uuid::Uuid;

const CREATE_FAILED: &str = "could not create new role, try again later";
const UPDATE_FAILED: &str = "could not update role, try again later";

/// Creates and updates roles on behalf of an administrative caller.
///
/// Generic over repository implementations so that provisioning has no
/// dependency on the database crate.
pub struct RoleProvisioner<A: ApplicationRepository, R: RoleRepository> {
    app_repo: A,
    role_repo: R,
}

impl<A: ApplicationRepository, R: RoleRepository> RoleProvisioner<A, R> {
    pub fn new(app_repo: A, role_repo: R) -> Self {
        Self {
            app_repo,
            role_repo,
        }
    }

    /// Validate `input`, derive its tag from the owning application and
    /// persist it. Returns the new role's id.
    pub async fn create(&self, input: NewRole) -> KeywardResult<Uuid> {
        let app = self.resolve(&input).await?;
        let create = CreateRole::for_application(&app, input);
        let tag = create.tag.clone();

        match self.role_repo.create(create).await {
            Ok(id) => {
                debug!(%id, %tag, "Provisioned role");
                Ok(id)
            }
            Err(err) => Err(surface(err, &tag, CREATE_FAILED)),
        }
    }

    /// Replace the role `id` with `input`, re-deriving its tag.
    pub async fn update(&self, id: Uuid, input: NewRole) -> KeywardResult<()> {
        let id = require_identifier(id)?;
        let app = self.resolve(&input).await?;
        let existing = self.role_repo.get(id).await?;

        let tag = derive_tag(&app, &input.name);
        let role = Role {
            id: existing.id,
            application_id: app.id,
            name: input.name,
            description: input.description,
            tag: tag.clone(),
            permission: input.permission,
            created_at: existing.created_at,
            updated_at: existing.updated_at,
        };

        match self.role_repo.update(role).await {
            Ok(()) => {
                debug!(%id, %tag, "Updated role");
                Ok(())
            }
            Err(err) => Err(surface(err, &tag, UPDATE_FAILED)),
        }
    }

    /// Steps shared by create and update, in order: application reference,
    /// application lookup, name rules, permission shape.
    async fn resolve(&self, input: &NewRole) -> KeywardResult<Application> {
        if input.application_id.is_nil() {
            return Err(KeywardError::MissingApplicationReference);
        }
        let app = self.app_repo.get(input.application_id).await?;
        validate_role_name(&input.name)?;
        input.permission.validate()?;
        Ok(app)
    }
}

/// Missing records and duplicate tags stay distinguishable; anything
/// else loses its detail.
fn surface(err: KeywardError, tag: &str, fallback: &str) -> KeywardError {
    match err {
        KeywardError::NotFound { .. } => err,
        KeywardError::DuplicateKey { .. } => {
            warn!(%tag, "Role tag already exists");
            KeywardError::DuplicateKey {
                entity: "role".into(),
            }
        }
        other => {
            error!(%tag, error = %other, "Role write failed");
            KeywardError::StorageFailure(fallback.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use keyward_core::models::application::{ApplicationFilter, CreateApplication};

    use super::*;

    struct OneApp(Application);

    impl ApplicationRepository for OneApp {
        async fn ensure_schema(&self) -> KeywardResult<()> {
            Ok(())
        }

        async fn list(&self, _filter: ApplicationFilter) -> KeywardResult<Vec<Application>> {
            Ok(vec![self.0.clone()])
        }

        async fn get(&self, id: Uuid) -> KeywardResult<Application> {
            if id == self.0.id {
                Ok(self.0.clone())
            } else {
                Err(KeywardError::NotFound {
                    entity: "application".into(),
                    id: id.to_string(),
                })
            }
        }

        async fn create(&self, _input: CreateApplication) -> KeywardResult<Uuid> {
            Ok(self.0.id)
        }

        async fn update(&self, _app: Application) -> KeywardResult<()> {
            Ok(())
        }

        async fn soft_delete(&self, _id: Uuid) -> KeywardResult<()> {
            Ok(())
        }
    }

    /// Records every create and answers with a canned error, if any.
    #[derive(Default)]
    struct Recorder {
        created: Mutex<Vec<CreateRole>>,
        fail_with: Option<fn() -> KeywardError>,
    }

    impl RoleRepository for Recorder {
        async fn create(&self, input: CreateRole) -> KeywardResult<Uuid> {
            self.created.lock().unwrap().push(input);
            match self.fail_with {
                Some(make) => Err(make()),
                None => Ok(Uuid::new_v4()),
            }
        }

        async fn get(&self, id: Uuid) -> KeywardResult<Role> {
            Err(KeywardError::NotFound {
                entity: "role".into(),
                id: id.to_string(),
            })
        }

        async fn get_owning_application(&self, id: Uuid) -> KeywardResult<Application> {
            Err(KeywardError::NotFound {
                entity: "role".into(),
                id: id.to_string(),
            })
        }

        async fn list_by_application(&self, _app_id: Uuid) -> KeywardResult<Vec<Role>> {
            Ok(Vec::new())
        }

        async fn update(&self, _role: Role) -> KeywardResult<()> {
            Ok(())
        }

        async fn soft_delete(&self, _id: Uuid) -> KeywardResult<()> {
            Ok(())
        }
    }

    fn app() -> Application {
        let now = Utc::now();
        Application {
            id: Uuid::new_v4(),
            name: "Service A".into(),
            external_id: "svc-a".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn new_role(app_id: Uuid, name: &str) -> NewRole {
        NewRole {
            application_id: app_id,
            name: name.into(),
            ..NewRole::default()
        }
    }

    #[tokio::test]
    async fn derives_tag_from_unstripped_name() {
        let app = app();
        let provisioner = RoleProvisioner::new(OneApp(app.clone()), Recorder::default());

        provisioner
            .create(new_role(app.id, "admin/read"))
            .await
            .unwrap();

        let created = provisioner.role_repo.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].tag, "svc-a/admin/read");
        assert_eq!(created[0].application_id, app.id);
    }

    #[tokio::test]
    async fn rejections_never_reach_storage() {
        let app = app();
        let provisioner = RoleProvisioner::new(OneApp(app.clone()), Recorder::default());

        let err = provisioner
            .create(new_role(Uuid::nil(), "admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, KeywardError::MissingApplicationReference));

        let err = provisioner
            .create(new_role(Uuid::new_v4(), "admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, KeywardError::NotFound { .. }));

        let err = provisioner
            .create(new_role(app.id, "admin read"))
            .await
            .unwrap_err();
        assert!(matches!(err, KeywardError::InvalidRoleName { .. }));

        let err = provisioner
            .create(new_role(app.id, "admin.read"))
            .await
            .unwrap_err();
        assert!(matches!(err, KeywardError::InvalidRoleName { .. }));

        assert!(provisioner.role_repo.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_detail_is_not_leaked() {
        let app = app();
        let roles = Recorder {
            fail_with: Some(|| KeywardError::StorageFailure("connection reset by peer".into())),
            ..Recorder::default()
        };
        let provisioner = RoleProvisioner::new(OneApp(app.clone()), roles);

        let err = provisioner
            .create(new_role(app.id, "admin"))
            .await
            .unwrap_err();
        match err {
            KeywardError::StorageFailure(msg) => assert_eq!(msg, CREATE_FAILED),
            other => panic!("expected StorageFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn vanished_application_stays_not_found() {
        let app = app();
        let roles = Recorder {
            fail_with: Some(|| KeywardError::NotFound {
                entity: "application".into(),
                id: "referenced by role".into(),
            }),
            ..Recorder::default()
        };
        let provisioner = RoleProvisioner::new(OneApp(app.clone()), roles);

        let err = provisioner
            .create(new_role(app.id, "admin"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, KeywardError::NotFound { ref entity, .. } if entity == "application"),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn duplicate_is_reported_as_role() {
        let app = app();
        let roles = Recorder {
            fail_with: Some(|| KeywardError::DuplicateKey {
                entity: "tag".into(),
            }),
            ..Recorder::default()
        };
        let provisioner = RoleProvisioner::new(OneApp(app.clone()), roles);

        let err = provisioner
            .create(new_role(app.id, "admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, KeywardError::DuplicateKey { ref entity } if entity == "role"));
    }
}
