//! `/employees`

use serde::Serialize;
use steward_domain::{ApiError, Employee, ListParams, Page, ResourceKind};

use super::crud::Collection;
use crate::query::{FetchPolicy, ResourceClient, ttl};

/// Employee records.
#[derive(Debug, Clone)]
pub struct EmployeesApi {
    employees: Collection,
}

impl EmployeesApi {
    /// Creates the API over `client`.
    #[must_use]
    pub const fn new(client: ResourceClient) -> Self {
        Self {
            employees: Collection::new(client, ResourceKind::Employees, ttl::DEFAULT_LIST),
        }
    }

    /// One page of employees.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn list(
        &self,
        page: u32,
        size: u32,
        policy: FetchPolicy,
    ) -> Result<Page<Employee>, ApiError> {
        self.employees.list(ListParams::paged(page, size), policy).await
    }

    /// Employees matching `keyword`.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn search(
        &self,
        keyword: &str,
        page: u32,
        size: u32,
        policy: FetchPolicy,
    ) -> Result<Page<Employee>, ApiError> {
        let params = ListParams::paged(page, size)
            .with_view("search")
            .with_keyword(keyword);
        self.employees.list(params, policy).await
    }

    /// One employee by id.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn get(&self, id: u64, policy: FetchPolicy) -> Result<Employee, ApiError> {
        self.employees.get(id, policy).await
    }

    /// Creates an employee from any serializable form.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn create<B: Serialize + ?Sized>(&self, employee: &B) -> Result<Employee, ApiError> {
        self.employees.create(employee).await
    }

    /// Updates an employee.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        id: u64,
        employee: &B,
    ) -> Result<Employee, ApiError> {
        self.employees.update(id, employee).await
    }

    /// Deletes an employee.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.employees.delete(id).await
    }
}
