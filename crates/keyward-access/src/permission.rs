//! Permission aggregation: an application together with its roles.

use keyward_core::error::KeywardResult;
use keyward_core::models::application::{Application, ApplicationWithRoles};
use keyward_core::repository::{ApplicationRepository, RoleRepository};
use tracing::error;
use uuid::Uuid;

/// Read-side composition over the application and role repositories.
pub struct PermissionService<A: ApplicationRepository, R: RoleRepository> {
    app_repo: A,
    role_repo: R,
}

impl<A: ApplicationRepository, R: RoleRepository> PermissionService<A, R> {
    pub fn new(app_repo: A, role_repo: R) -> Self {
        Self {
            app_repo,
            role_repo,
        }
    }

    pub async fn get_app(&self, id: Uuid) -> KeywardResult<Application> {
        self.app_repo.get(id).await
    }

    /// The application plus every live role it owns.
    ///
    /// A failure to list roles fails the whole call; a partial result is
    /// never returned.
    pub async fn get_app_with_roles(&self, id: Uuid) -> KeywardResult<ApplicationWithRoles> {
        let application = self.app_repo.get(id).await?;
        let roles = self
            .role_repo
            .list_by_application(application.id)
            .await
            .inspect_err(|e| error!(app_id = %id, error = %e, "Failed to list roles"))?;

        Ok(ApplicationWithRoles { application, roles })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use keyward_core::error::KeywardError;
    use keyward_core::models::application::{ApplicationFilter, CreateApplication};
    use keyward_core::models::role::{CreateRole, Role};

    use super::*;

    struct OneApp(Application);

    impl ApplicationRepository for OneApp {
        async fn ensure_schema(&self) -> KeywardResult<()> {
            Ok(())
        }

        async fn list(&self, _filter: ApplicationFilter) -> KeywardResult<Vec<Application>> {
            Ok(vec![self.0.clone()])
        }

        async fn get(&self, _id: Uuid) -> KeywardResult<Application> {
            Ok(self.0.clone())
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

    /// Every call fails as if the store were unreachable.
    struct BrokenRoles;

    impl RoleRepository for BrokenRoles {
        async fn create(&self, _input: CreateRole) -> KeywardResult<Uuid> {
            Err(KeywardError::StorageFailure("down".into()))
        }

        async fn get(&self, _id: Uuid) -> KeywardResult<Role> {
            Err(KeywardError::StorageFailure("down".into()))
        }

        async fn get_owning_application(&self, _id: Uuid) -> KeywardResult<Application> {
            Err(KeywardError::StorageFailure("down".into()))
        }

        async fn list_by_application(&self, _app_id: Uuid) -> KeywardResult<Vec<Role>> {
            Err(KeywardError::StorageFailure("down".into()))
        }

        async fn update(&self, _role: Role) -> KeywardResult<()> {
            Err(KeywardError::StorageFailure("down".into()))
        }

        async fn soft_delete(&self, _id: Uuid) -> KeywardResult<()> {
            Err(KeywardError::StorageFailure("down".into()))
        }
    }

    #[tokio::test]
    async fn role_listing_failure_is_propagated() {
        let now = Utc::now();
        let app = Application {
            id: Uuid::new_v4(),
            name: "Service A".into(),
            external_id: "svc-a".into(),
            created_at: now,
            updated_at: now,
        };
        let service = PermissionService::new(OneApp(app.clone()), BrokenRoles);

        assert_eq!(service.get_app(app.id).await.unwrap(), app);
        let err = service.get_app_with_roles(app.id).await.unwrap_err();
        assert!(matches!(err, KeywardError::StorageFailure(_)));
    }
}
