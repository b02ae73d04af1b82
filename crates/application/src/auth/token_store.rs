//! Durable bearer-token storage with expiry reporting.
//!
//! The token lives in the [`KeyValueStore`] under [`TOKEN_KEY`], so it
//! survives a restart and every context sharing the store sees changes to it.
//! Nothing here decides whether a token is acceptable; that is the session
//! manager's job.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use steward_domain::Credential;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::ApplicationResult;
use crate::ports::{KeyValueStore, StorageChange};

/// Store key of the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Older clients kept the login e-mail next to the token; it is removed with it.
pub const LEGACY_EMAIL_KEY: &str = "userEmail";

/// Handle on the persisted credential.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    /// Creates a token store over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persists the credential, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub async fn set(&self, credential: &Credential) -> ApplicationResult<()> {
        debug!(token = %credential.preview(), "storing credential");
        self.store.set(TOKEN_KEY, credential.token()).await?;
        Ok(())
    }

    /// Returns the raw stored token, if any.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn raw(&self) -> ApplicationResult<Option<String>> {
        Ok(self.store.get(TOKEN_KEY).await?)
    }

    /// Returns the stored credential with its claims decoded.
    ///
    /// # Errors
    /// Returns [`ApplicationError::Claims`](crate::ApplicationError::Claims)
    /// if a token is stored but cannot be decoded, or a storage error.
    pub async fn get(&self) -> ApplicationResult<Option<Credential>> {
        match self.raw().await? {
            Some(token) if !token.trim().is_empty() => Ok(Some(Credential::parse(token)?)),
            _ => Ok(None),
        }
    }

    /// Removes the credential and the legacy e-mail key.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub async fn clear(&self) -> ApplicationResult<()> {
        debug!("clearing credential");
        self.store.remove(TOKEN_KEY).await?;
        self.store.remove(LEGACY_EMAIL_KEY).await?;
        Ok(())
    }

    /// Subscribes to changes of the underlying store. Receivers see every
    /// key; filter on [`TOKEN_KEY`].
    #[must_use]
    pub fn changes(&self) -> broadcast::Receiver<StorageChange> {
        self.store.subscribe()
    }

    /// Reports the stored credential's status at `now`, for display.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn status(&self, now: DateTime<Utc>) -> ApplicationResult<TokenStatus> {
        let Some(raw) = self.raw().await? else {
            return Ok(TokenStatus::NotAuthenticated);
        };
        Ok(match Credential::parse(raw) {
            Err(_) => TokenStatus::Malformed,
            Ok(credential) if credential.claims().is_expired_at(now) => TokenStatus::Expired {
                subject: credential.subject().to_string(),
            },
            Ok(credential) => TokenStatus::Valid {
                subject: credential.subject().to_string(),
                seconds_remaining: credential.claims().seconds_until_expiry(now),
            },
        })
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

/// Status of the stored token for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No token is stored.
    NotAuthenticated,
    /// A token is stored but cannot be decoded.
    Malformed,
    /// The token is valid.
    Valid {
        /// Subject of the token.
        subject: String,
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// The token's expiry has passed.
    Expired {
        /// Subject of the token.
        subject: String,
    },
}

impl TokenStatus {
    /// Returns true if the token is valid (not expired).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Not authenticated".to_string(),
            Self::Malformed => "Stored token is unreadable".to_string(),
            Self::Valid {
                subject,
                seconds_remaining,
            } => {
                let secs = *seconds_remaining;
                let remaining = if secs > 3600 {
                    format!("{} hours", secs / 3600)
                } else if secs > 60 {
                    format!("{} minutes", secs / 60)
                } else {
                    format!("{secs} seconds")
                };
                format!("Logged in as {subject} (valid for {remaining})")
            }
            Self::Expired { subject } => format!("Session of {subject} expired"),
        }
    }
}
