//! `/roles`

use serde::Serialize;
use serde_json::Value;
use steward_domain::{ApiError, ApiRequest, AssignRoles, ListParams, ResourceKind, Role};

use super::crud::Collection;
use super::json_body;
use crate::query::{FetchPolicy, ResourceClient, ttl};

const KIND: ResourceKind = ResourceKind::Roles;

/// Roles and their assignment to users.
#[derive(Debug, Clone)]
pub struct RolesApi {
    roles: Collection,
}

impl RolesApi {
    /// Creates the API over `client`.
    #[must_use]
    pub const fn new(client: ResourceClient) -> Self {
        Self {
            roles: Collection::new(client, KIND, ttl::DEFAULT_LIST),
        }
    }

    /// All roles.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn list(&self, policy: FetchPolicy) -> Result<Vec<Role>, ApiError> {
        self.roles.list(ListParams::all(), policy).await
    }

    /// Roles held by one user.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn of_user(&self, user_id: u64, policy: FetchPolicy) -> Result<Vec<Role>, ApiError> {
        self.roles
            .list(ListParams::all().with_view(format!("user/{user_id}")), policy)
            .await
    }

    /// One role by id.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn get(&self, id: u64, policy: FetchPolicy) -> Result<Role, ApiError> {
        self.roles.get(id, policy).await
    }

    /// Creates a role.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn create<B: Serialize + ?Sized>(&self, role: &B) -> Result<Role, ApiError> {
        self.roles.create(role).await
    }

    /// Updates a role.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn update<B: Serialize + ?Sized>(&self, id: u64, role: &B) -> Result<Role, ApiError> {
        self.roles.update(id, role).await
    }

    /// Deletes a role.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.roles.delete(id).await
    }

    /// Replaces the roles of a user. Drops cached roles, user listings and
    /// the current-user profile.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn assign(&self, assignment: &AssignRoles) -> Result<(), ApiError> {
        let request = ApiRequest::post(self.roles.path("assign"), json_body(assignment)?);
        let _: Value = self.roles.client().mutate(request, KIND, None).await?;
        Ok(())
    }

    /// Takes `role_ids` away from a user.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn unassign(&self, user_id: u64, role_ids: &[u64]) -> Result<(), ApiError> {
        let request = ApiRequest::delete(self.roles.path(format!("user/{user_id}")))
            .with_json(json_body(role_ids)?);
        let _: Value = self.roles.client().mutate(request, KIND, None).await?;
        Ok(())
    }
}
