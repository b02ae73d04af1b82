//! Resource kinds known to the console.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A backend resource type; the first component of every cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// `/users`
    Users,
    /// `/auth/me`, the logged-in user's own profile
    CurrentUser,
    /// `/employees`
    Employees,
    /// `/departments`
    Departments,
    /// `/jobs`
    Jobs,
    /// `/roles`
    Roles,
    /// `/files`
    Files,
    /// `/translations`
    Translations,
    /// `/translations/languages`
    Languages,
}

impl ResourceKind {
    /// Returns all resource kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Users,
            Self::CurrentUser,
            Self::Employees,
            Self::Departments,
            Self::Jobs,
            Self::Roles,
            Self::Files,
            Self::Translations,
            Self::Languages,
        ]
    }

    /// Collection path on the backend.
    #[must_use]
    pub const fn base_path(self) -> &'static str {
        match self {
            Self::Users => "/users",
            Self::CurrentUser => "/auth/me",
            Self::Employees => "/employees",
            Self::Departments => "/departments",
            Self::Jobs => "/jobs",
            Self::Roles => "/roles",
            Self::Files => "/files",
            Self::Translations => "/translations",
            Self::Languages => "/translations/languages",
        }
    }

    /// Kinds whose cached data also goes stale when this kind is mutated.
    #[must_use]
    pub const fn dependents(self) -> &'static [Self] {
        match self {
            // Profile edits show up in /auth/me.
            Self::Users => &[Self::CurrentUser],
            // Role assignment changes the role column of user listings.
            Self::Roles => &[Self::Users, Self::CurrentUser],
            // New languages can appear with new translations.
            Self::Translations => &[Self::Languages],
            Self::Departments | Self::Jobs => &[Self::Employees],
            Self::CurrentUser | Self::Employees | Self::Files | Self::Languages => &[],
        }
    }

    /// Stable name used in logs and keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::CurrentUser => "current-user",
            Self::Employees => "employees",
            Self::Departments => "departments",
            Self::Jobs => "jobs",
            Self::Roles => "roles",
            Self::Files => "files",
            Self::Translations => "translations",
            Self::Languages => "languages",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
