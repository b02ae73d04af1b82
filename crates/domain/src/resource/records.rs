//! Resource records and request payloads.

#![allow(missing_docs)]

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Records on this page.
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// Total number of records across all pages.
    #[serde(default)]
    pub total_elements: u64,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Requested page size.
    #[serde(default)]
    pub size: u32,
    /// Zero-based page index.
    #[serde(default)]
    pub number: u32,
}

impl<T> Page<T> {
    /// Returns true if a page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }
}

/// A console user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Login e-mail.
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Role name, e.g. `ADMIN` or `USER`.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl User {
    /// Returns true if the account has the administrator role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.as_deref().is_some_and(|r| {
            r.eq_ignore_ascii_case("admin") || r.eq_ignore_ascii_case("role_admin")
        })
    }
}

/// An employee record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub salary: Option<f64>,
    #[serde(default)]
    pub department_id: Option<u64>,
    #[serde(default)]
    pub job_id: Option<u64>,
    #[serde(default)]
    pub manager_id: Option<u64>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub manager_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Employee {
    /// First and last name joined.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A department record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub manager_id: Option<u64>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub manager_name: Option<String>,
    #[serde(default)]
    pub employee_count: Option<u64>,
}

/// A job (position) record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub min_salary: Option<f64>,
    #[serde(default)]
    pub max_salary: Option<f64>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub benefits: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub employee_count: Option<u64>,
}

/// A role record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub user_ids: Vec<u64>,
    #[serde(default)]
    pub user_count: Option<u32>,
}

/// Metadata of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: u64,
    pub original_file_name: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// A single translated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub id: u64,
    pub translation_key: String,
    pub language_code: String,
    pub translation_value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Outcome of a bulk translation import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BulkTranslationResult {
    pub total_requested: u32,
    pub created: u32,
    pub skipped: u32,
    pub errors: u32,
}

impl BulkTranslationResult {
    /// Returns true if at least one translation was created.
    #[must_use]
    pub const fn has_new_translations(&self) -> bool {
        self.created > 0
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// Response of login and registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The bearer token.
    pub token: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Body of `POST /roles/assign`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoles {
    pub user_id: u64,
    pub role_ids: Vec<u64>,
}

/// A file to upload as multipart form data.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Original file name sent in the `file` part.
    pub file_name: String,
    /// File contents.
    pub contents: Vec<u8>,
    /// MIME type of the contents; guessed from the name when absent.
    pub mime_type: Option<String>,
    /// Value of the `description` field.
    pub description: String,
    /// Value of the `isPublic` field.
    pub is_public: bool,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// Body of `PUT /users/:id`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Body of `PUT /files/:id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpdate {
    pub description: String,
    pub is_public: bool,
}

/// Body of `POST /translations` and element of `POST /translations/bulk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTranslation {
    pub translation_key: String,
    pub language_code: String,
    pub translation_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Answer of `GET /auth/oauth2/:provider/authorize`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthAuthorization {
    /// Provider page the user has to visit.
    pub authorization_url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_spring_page() {
        let json = r#"{
            "content": [{"id": 1, "name": "Ann", "email": "ann@example.com", "role": "ADMIN",
                         "createdAt": "2024-05-01T10:00:00"}],
            "totalElements": 11, "totalPages": 2, "size": 10, "number": 0,
            "pageable": {"pageNumber": 0}
        }"#;
        let page: Page<User> = serde_json::from_str(json).unwrap();
        assert_eq!(page.content.len(), 1);
        assert!(page.content[0].is_admin());
        assert!(page.has_next());
        assert_eq!(page.total_elements, 11);
    }

    #[test]
    fn employee_tolerates_missing_optionals() {
        let json = r#"{"id": 3, "firstName": "Bo", "lastName": "Li", "email": "bo@x.io"}"#;
        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.full_name(), "Bo Li");
        assert!(employee.department_id.is_none());
    }

    #[test]
    fn partial_update_skips_absent_fields() {
        let body = serde_json::to_value(UserUpdate {
            phone: Some("+998".to_string()),
            ..UserUpdate::default()
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"phone": "+998"}));
    }

    #[test]
    fn assign_roles_uses_camel_case() {
        let body = serde_json::to_value(AssignRoles {
            user_id: 4,
            role_ids: vec![1, 2],
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"userId": 4, "roleIds": [1, 2]}));
    }
}
