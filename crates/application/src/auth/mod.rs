//! Credential persistence.

mod token_store;

pub use token_store::{LEGACY_EMAIL_KEY, TOKEN_KEY, TokenStatus, TokenStore};
