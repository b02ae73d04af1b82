//! Typed resource APIs.
//!
//! Each API is a thin, cheaply cloned handle over the shared
//! [`ResourceClient`](crate::query::ResourceClient): queries go through the
//! cache, mutations invalidate what they touch.

mod auth;
mod crud;
mod departments;
mod employees;
mod files;
mod jobs;
mod roles;
mod translations;
mod users;

pub use auth::AuthApi;
pub use departments::DepartmentsApi;
pub use employees::EmployeesApi;
pub use files::FilesApi;
pub use jobs::JobsApi;
pub use roles::RolesApi;
pub use translations::TranslationsApi;
pub use users::UsersApi;

use serde::Serialize;
use serde_json::Value;
use steward_domain::ApiError;

/// Encodes a request body.
fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(format!("request body: {e}")))
}
