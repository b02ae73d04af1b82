//! `/users`

use steward_domain::{ApiError, ListParams, NewUser, Page, ResourceKind, User, UserUpdate};

use super::crud::Collection;
use crate::query::{FetchPolicy, ResourceClient, ttl};

/// User administration.
#[derive(Debug, Clone)]
pub struct UsersApi {
    users: Collection,
}

impl UsersApi {
    /// Creates the API over `client`.
    #[must_use]
    pub const fn new(client: ResourceClient) -> Self {
        Self {
            users: Collection::new(client, ResourceKind::Users, ttl::USERS_LIST),
        }
    }

    /// One page of users.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn list(
        &self,
        page: u32,
        size: u32,
        policy: FetchPolicy,
    ) -> Result<Page<User>, ApiError> {
        self.users.list(ListParams::paged(page, size), policy).await
    }

    /// One user by id.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn get(&self, id: u64, policy: FetchPolicy) -> Result<User, ApiError> {
        self.users.get(id, policy).await
    }

    /// Creates a user.
    ///
    /// # Errors
    /// Returns the backend error; validation failures carry field errors.
    pub async fn create(&self, user: &NewUser) -> Result<User, ApiError> {
        self.users.create(user).await
    }

    /// Updates a user's profile fields. Also drops the cached current-user
    /// profile, which may be the same account.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn update(&self, id: u64, update: &UserUpdate) -> Result<User, ApiError> {
        self.users.update(id, update).await
    }

    /// Deletes a user.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.users.delete(id).await
    }
}
