//! Steward Domain - Core types of the admin console client
//!
//! This crate defines the domain model shared by the session, gateway and
//! cache layers. All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod cache;
pub mod error;
pub mod request;
pub mod resource;
pub mod response;
pub mod session;
pub mod settings;

pub use auth::{Claims, ClaimsError, Credential};
pub use cache::{CacheKey, KeyPattern, ListParams, Qualifier};
pub use error::{ApiError, DomainError, DomainResult, ErrorKind, ErrorPayload, FieldError};
pub use request::{ApiRequest, EndpointClass, HttpMethod, RequestBody};
pub use resource::{
    AssignRoles, AuthResponse, BulkTranslationResult, Department, Employee, FileUpdate,
    FileUpload, Job, LoginRequest, NewTranslation, NewUser, OAuthAuthorization, Page,
    RegisterRequest, ResourceKind, Role, StoredFile, Translation, User, UserUpdate,
};
pub use response::{ApiResponse, StatusCode};
pub use session::{SessionEndReason, SessionEvent, SessionPhase, SessionState};
pub use settings::{LANGUAGE_KEY, Locale, Preferences, THEME_KEY, ThemeMode};
