//! `/departments`

use serde::Serialize;
use steward_domain::{ApiError, Department, ListParams, ResourceKind};

use super::crud::Collection;
use crate::query::{FetchPolicy, ResourceClient, ttl};

/// Departments. Changes here also drop cached employee data, which embeds
/// department names.
#[derive(Debug, Clone)]
pub struct DepartmentsApi {
    departments: Collection,
}

impl DepartmentsApi {
    /// Creates the API over `client`.
    #[must_use]
    pub const fn new(client: ResourceClient) -> Self {
        Self {
            departments: Collection::new(client, ResourceKind::Departments, ttl::DEFAULT_LIST),
        }
    }

    /// All departments.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn list(&self, policy: FetchPolicy) -> Result<Vec<Department>, ApiError> {
        self.departments.list(ListParams::all(), policy).await
    }

    /// Only active departments.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn active(&self, policy: FetchPolicy) -> Result<Vec<Department>, ApiError> {
        self.departments.list(ListParams::all().with_view("active"), policy).await
    }

    /// One department by id.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn get(&self, id: u64, policy: FetchPolicy) -> Result<Department, ApiError> {
        self.departments.get(id, policy).await
    }

    /// Creates a department.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn create<B: Serialize + ?Sized>(
        &self,
        department: &B,
    ) -> Result<Department, ApiError> {
        self.departments.create(department).await
    }

    /// Updates a department.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        id: u64,
        department: &B,
    ) -> Result<Department, ApiError> {
        self.departments.update(id, department).await
    }

    /// Deletes a department.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.departments.delete(id).await
    }
}
