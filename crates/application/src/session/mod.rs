//! Authentication session lifecycle.

mod manager;

pub use manager::{DEFAULT_EXPIRY_CHECK_INTERVAL, SessionConfig, SessionManager};
