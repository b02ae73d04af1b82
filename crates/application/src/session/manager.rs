//! Session state machine.
//!
//! ```text
//!   Anonymous --login/restore/remote token--> Authenticated
//!   Authenticated --logout/401/expiry/remote removal--> Expiring --> Anonymous
//! ```
//!
//! Every transition runs under one async transition lock, so the store write
//! and the state flip of one transition are never interleaved with another
//! transition or with reconciliation of a cross-context store change. The
//! state itself sits behind a synchronous lock that is never held across an
//! `.await`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use steward_domain::{Credential, SessionEndReason, SessionEvent, SessionPhase, SessionState, User};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::auth::{TOKEN_KEY, TokenStore};
use crate::cache::ResourceCache;
use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::Clock;

/// How often an authenticated session checks its token's expiry by default.
pub const DEFAULT_EXPIRY_CHECK_INTERVAL: Duration = Duration::from_secs(60);

const EVENT_CAPACITY: usize = 32;

/// Session manager settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Period of the expiry check while authenticated.
    pub expiry_check_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry_check_interval: DEFAULT_EXPIRY_CHECK_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreCleanup {
    /// Remove the stored token.
    Clear,
    /// Leave the store alone; another context already changed it.
    Keep,
}

struct Shared {
    tokens: TokenStore,
    cache: Arc<ResourceCache>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    transition: tokio::sync::Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
    expiry_task: Mutex<Option<JoinHandle<()>>>,
    store_watcher: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(task) = self.expiry_task.get_mut().take() {
            task.abort();
        }
        if let Some(task) = self.store_watcher.get_mut().take() {
            task.abort();
        }
    }
}

/// Owns the authentication state of one console instance.
///
/// Cloning yields another handle on the same session.
#[derive(Clone)]
pub struct SessionManager {
    shared: Arc<Shared>,
}

impl SessionManager {
    /// Creates an anonymous session manager.
    #[must_use]
    pub fn new(
        tokens: TokenStore,
        cache: Arc<ResourceCache>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                tokens,
                cache,
                clock,
                config,
                state: Mutex::new(SessionState::default()),
                transition: tokio::sync::Mutex::new(()),
                events: broadcast::channel(EVENT_CAPACITY).0,
                expiry_task: Mutex::new(None),
                store_watcher: Mutex::new(None),
            }),
        }
    }

    /// Subscribes to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.state.lock().clone()
    }

    /// Returns true while a credential is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.shared.state.lock().is_authenticated()
    }

    /// Current session generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.shared.state.lock().generation
    }

    /// The logged-in user's profile, once loaded.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.shared.state.lock().current_user.clone()
    }

    /// The `Authorization` header value together with the generation it
    /// belongs to, read atomically. `None` while anonymous.
    #[must_use]
    pub fn authorization(&self) -> Option<(String, u64)> {
        let state = self.shared.state.lock();
        if !state.is_authenticated() {
            return None;
        }
        state
            .credential
            .as_ref()
            .map(|c| (c.authorization_header(), state.generation))
    }

    /// Starts a session from a freshly issued token.
    ///
    /// An undecodable or already expired token is rejected and the session
    /// stays as it was. A session that is already running is ended first.
    /// Returns the new session generation.
    ///
    /// # Errors
    /// Returns [`ApplicationError::Claims`] or
    /// [`ApplicationError::ExpiredCredential`] for unusable tokens, or a
    /// storage error if the token cannot be persisted.
    pub async fn login(&self, token: &str) -> ApplicationResult<u64> {
        let credential = match Credential::parse(token) {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "rejecting undecodable token");
                return Err(e.into());
            }
        };
        if credential.claims().is_expired_at(self.shared.clock.now()) {
            warn!(subject = credential.subject(), "rejecting expired token");
            return Err(ApplicationError::ExpiredCredential);
        }

        let _transition = self.shared.transition.lock().await;
        if self.is_authenticated() {
            self.end_locked(SessionEndReason::Explicit, StoreCleanup::Clear, None)
                .await;
        }
        self.shared.tokens.set(&credential).await?;
        Ok(self.adopt(credential))
    }

    /// Adopts the stored token at startup if it is readable and unexpired;
    /// otherwise removes it. Returns true if a session is running afterwards.
    ///
    /// # Errors
    /// Returns a storage error if the store cannot be read or cleaned.
    pub async fn restore(&self) -> ApplicationResult<bool> {
        let _transition = self.shared.transition.lock().await;
        let credential = match self.shared.tokens.get().await {
            Ok(Some(credential)) => credential,
            Ok(None) => return Ok(false),
            Err(ApplicationError::Claims(e)) => {
                warn!(error = %e, "discarding unreadable stored token");
                self.shared.tokens.clear().await?;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if credential.claims().is_expired_at(self.shared.clock.now()) {
            info!(subject = credential.subject(), "discarding expired stored token");
            self.shared.tokens.clear().await?;
            return Ok(false);
        }
        if self.holds_token(credential.token()) {
            return Ok(true);
        }
        if self.is_authenticated() {
            self.end_locked(SessionEndReason::Explicit, StoreCleanup::Keep, None)
                .await;
        }
        self.adopt(credential);
        Ok(true)
    }

    /// Ends the session at the user's request. A no-op while anonymous.
    /// Returns true if a session was ended.
    pub async fn logout(&self) -> bool {
        let _transition = self.shared.transition.lock().await;
        self.end_locked(SessionEndReason::Explicit, StoreCleanup::Clear, None)
            .await
    }

    /// Ends the session because the backend rejected the credential.
    /// Repeated calls end it at most once.
    pub async fn on_unauthorized(&self) -> bool {
        let _transition = self.shared.transition.lock().await;
        self.end_locked(SessionEndReason::ServerRejected, StoreCleanup::Clear, None)
            .await
    }

    /// Like [`Self::on_unauthorized`], but only if the session is still the
    /// one of `generation`. A 401 answering a request of an earlier session
    /// must not end a newer one.
    pub async fn on_unauthorized_at(&self, generation: u64) -> bool {
        let _transition = self.shared.transition.lock().await;
        let ended = self
            .end_locked(
                SessionEndReason::ServerRejected,
                StoreCleanup::Clear,
                Some(generation),
            )
            .await;
        if !ended {
            debug!(generation, "401 did not end a session");
        }
        ended
    }

    /// Ends the session if its token has expired. Runs on every tick of the
    /// expiry task; callable directly.
    pub async fn check_expiry(&self) -> bool {
        let now = self.shared.clock.now();
        let expired_generation = {
            let state = self.shared.state.lock();
            state
                .credential
                .as_ref()
                .filter(|c| state.is_authenticated() && c.claims().is_expired_at(now))
                .map(|_| state.generation)
        };
        let Some(generation) = expired_generation else {
            return false;
        };

        let _transition = self.shared.transition.lock().await;
        self.end_locked(
            SessionEndReason::Expired,
            StoreCleanup::Clear,
            Some(generation),
        )
        .await
    }

    /// Records the profile of the logged-in user, unless the session changed
    /// since `generation`. Returns true if the profile was applied.
    pub fn set_current_user(&self, generation: u64, user: User) -> bool {
        let subject = {
            let mut state = self.shared.state.lock();
            if !state.is_authenticated() || state.generation != generation {
                debug!(
                    generation,
                    current = state.generation,
                    "discarding profile of a previous session"
                );
                return false;
            }
            state.current_user = Some(user);
            state.subject().unwrap_or_default().to_string()
        };
        let _ = self.shared.events.send(SessionEvent::ProfileLoaded { subject });
        true
    }

    /// Follows token changes made by other contexts sharing the store: a
    /// removal ends the local session, a new valid token is adopted.
    pub fn watch_store(&self) {
        let weak = Arc::downgrade(&self.shared);
        let mut changes = self.shared.tokens.changes();
        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) if change.key != TOKEN_KEY => continue,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "storage notices were dropped; re-reading token");
                    }
                    Err(RecvError::Closed) => break,
                }
                let Some(manager) = Self::upgrade(&weak) else {
                    break;
                };
                manager.reconcile_with_store().await;
            }
        });
        if let Some(previous) = self.shared.store_watcher.lock().replace(task) {
            previous.abort();
        }
    }

    /// Stops the expiry task and the store watcher.
    pub fn shutdown(&self) {
        if let Some(task) = self.shared.expiry_task.lock().take() {
            task.abort();
        }
        if let Some(task) = self.shared.store_watcher.lock().take() {
            task.abort();
        }
    }

    fn upgrade(weak: &Weak<Shared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    fn holds_token(&self, token: &str) -> bool {
        let state = self.shared.state.lock();
        state.is_authenticated() && state.credential.as_ref().is_some_and(|c| c.token() == token)
    }

    /// Brings the local session in line with what the store holds now.
    /// Notices can arrive after later writes, so the store is re-read rather
    /// than trusting the notice.
    async fn reconcile_with_store(&self) {
        let _transition = self.shared.transition.lock().await;
        let stored = match self.shared.tokens.raw().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "cannot read token after storage change");
                return;
            }
        };

        match stored {
            None => {
                if self
                    .end_locked(SessionEndReason::Explicit, StoreCleanup::Keep, None)
                    .await
                {
                    info!("session ended in another context");
                }
            }
            Some(token) if self.holds_token(&token) => {}
            Some(token) => match Credential::parse(token) {
                Ok(credential) if !credential.claims().is_expired_at(self.shared.clock.now()) => {
                    self.end_locked(SessionEndReason::Explicit, StoreCleanup::Keep, None)
                        .await;
                    info!(
                        subject = credential.subject(),
                        "adopting session started in another context"
                    );
                    self.adopt(credential);
                }
                Ok(_) | Err(_) => debug!("ignoring unusable token written by another context"),
            },
        }
    }

    /// Installs `credential` as the running session. Caller holds the
    /// transition lock.
    fn adopt(&self, credential: Credential) -> u64 {
        let subject = credential.subject().to_string();
        let expires_at = credential.claims().expires_at();
        let generation = {
            let mut state = self.shared.state.lock();
            state.phase = SessionPhase::Authenticated;
            state.credential = Some(credential);
            state.current_user = None;
            state.generation += 1;
            state.generation
        };
        self.start_expiry_task();
        info!(%subject, %expires_at, generation, "session started");
        let _ = self.shared.events.send(SessionEvent::Started { subject });
        generation
    }

    /// Tears the session down. Caller holds the transition lock. Returns
    /// false, doing nothing, if no session is running or it is not the one
    /// of `expected_generation`.
    async fn end_locked(
        &self,
        reason: SessionEndReason,
        cleanup: StoreCleanup,
        expected_generation: Option<u64>,
    ) -> bool {
        let subject = {
            let mut state = self.shared.state.lock();
            if !state.is_authenticated()
                || expected_generation.is_some_and(|g| g != state.generation)
            {
                return false;
            }
            state.phase = SessionPhase::Expiring;
            state.generation += 1;
            state.current_user = None;
            state.credential.take().map(|c| c.subject().to_string())
        };
        self.stop_expiry_task();

        match reason {
            SessionEndReason::Explicit => info!(?subject, "session ended"),
            SessionEndReason::Expired | SessionEndReason::ServerRejected => {
                warn!(?subject, ?reason, "session ended");
            }
        }

        if cleanup == StoreCleanup::Clear
            && let Err(e) = self.shared.tokens.clear().await
        {
            warn!(error = %e, "failed to clear stored credential");
        }
        self.shared.cache.clear_all();

        {
            let mut state = self.shared.state.lock();
            if state.phase == SessionPhase::Expiring {
                state.phase = SessionPhase::Anonymous;
            }
        }
        let _ = self.shared.events.send(SessionEvent::Ended { reason });
        true
    }

    fn start_expiry_task(&self) {
        let weak = Arc::downgrade(&self.shared);
        let period = match self.shared.config.expiry_check_interval {
            period if period.is_zero() => DEFAULT_EXPIRY_CHECK_INTERVAL,
            period => period,
        };

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(manager) = Self::upgrade(&weak) else {
                    break;
                };
                if manager.check_expiry().await || !manager.is_authenticated() {
                    break;
                }
            }
        });

        if let Some(previous) = self.shared.expiry_task.lock().replace(task) {
            previous.abort();
        }
    }

    fn stop_expiry_task(&self) {
        let Some(task) = self.shared.expiry_task.lock().take() else {
            return;
        };
        // The expiry task ends sessions itself; it exits on its own afterwards.
        if tokio::task::try_id() != Some(task.id()) {
            task.abort();
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("SessionManager")
            .field("phase", &state.phase)
            .field("generation", &state.generation)
            .finish_non_exhaustive()
    }
}
