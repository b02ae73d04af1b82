//! `/jobs`

use serde::Serialize;
use steward_domain::{ApiError, Job, ListParams, ResourceKind};

use super::crud::Collection;
use crate::query::{FetchPolicy, ResourceClient, ttl};

/// Jobs (positions). Changes here also drop cached employee data, which embeds
/// job names.
#[derive(Debug, Clone)]
pub struct JobsApi {
    jobs: Collection,
}

impl JobsApi {
    /// Creates the API over `client`.
    #[must_use]
    pub const fn new(client: ResourceClient) -> Self {
        Self {
            jobs: Collection::new(client, ResourceKind::Jobs, ttl::DEFAULT_LIST),
        }
    }

    /// All jobs.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn list(&self, policy: FetchPolicy) -> Result<Vec<Job>, ApiError> {
        self.jobs.list(ListParams::all(), policy).await
    }

    /// Only active jobs.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn active(&self, policy: FetchPolicy) -> Result<Vec<Job>, ApiError> {
        self.jobs.list(ListParams::all().with_view("active"), policy).await
    }

    /// One job by id.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn get(&self, id: u64, policy: FetchPolicy) -> Result<Job, ApiError> {
        self.jobs.get(id, policy).await
    }

    /// Creates a job.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn create<B: Serialize + ?Sized>(&self, job: &B) -> Result<Job, ApiError> {
        self.jobs.create(job).await
    }

    /// Updates a job.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn update<B: Serialize + ?Sized>(&self, id: u64, job: &B) -> Result<Job, ApiError> {
        self.jobs.update(id, job).await
    }

    /// Deletes a job.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.jobs.delete(id).await
    }
}
