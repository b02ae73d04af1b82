//! Session state types.
//!
//! The session state machine has three phases:
//! - `Anonymous`: no credential, only public endpoints are reachable
//! - `Authenticated`: a credential is stored and assumed valid
//! - `Expiring`: transient, while a session is being torn down

use serde::{Deserialize, Serialize};

use crate::auth::Credential;
use crate::resource::User;

/// Phase of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No credential is held.
    #[default]
    Anonymous,
    /// A credential is held and assumed valid.
    Authenticated,
    /// Teardown in progress; never observable once the transition completes.
    Expiring,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionEndReason {
    /// The user logged out, here or in another context.
    Explicit,
    /// The token's expiry passed, detected locally.
    Expired,
    /// The backend answered 401.
    ServerRejected,
}

impl SessionEndReason {
    /// Returns a user-facing explanation.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Explicit => "Logged out",
            Self::Expired | Self::ServerRejected => "Session expired. Please login again.",
        }
    }
}

/// Signals emitted by the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session started.
    Started {
        /// Subject of the new credential.
        subject: String,
    },
    /// The current user's profile was loaded.
    ProfileLoaded {
        /// Subject of the session the profile belongs to.
        subject: String,
    },
    /// The session ended. Emitted exactly once per session.
    Ended {
        /// Why it ended.
        reason: SessionEndReason,
    },
}

/// Snapshot of the authentication state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Current phase.
    pub phase: SessionPhase,
    /// The held credential, if any.
    pub credential: Option<Credential>,
    /// Denormalized profile of the logged-in user, loaded best-effort.
    pub current_user: Option<User>,
    /// Incremented on every session start and end. Results of requests issued
    /// under an older generation must not update state.
    pub generation: u64,
}

impl SessionState {
    /// Returns true while a credential is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.phase, SessionPhase::Authenticated)
    }

    /// Subject of the held credential.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.credential.as_ref().map(Credential::subject)
    }
}
