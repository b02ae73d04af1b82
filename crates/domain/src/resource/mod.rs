//! Backend resource types.
//!
//! Records mirror the backend's JSON shapes (camelCase on the wire). They are
//! plain data: the client never edits a record in place, it refetches.

mod kind;
mod records;

pub use kind::ResourceKind;
pub use records::{
    AssignRoles, AuthResponse, BulkTranslationResult, Department, Employee, FileUpdate,
    FileUpload, Job, LoginRequest, NewTranslation, NewUser, OAuthAuthorization, Page,
    RegisterRequest, Role, StoredFile, Translation, User, UserUpdate,
};
