//! The assembled client.

use std::sync::Arc;

use steward_domain::{CacheKey, LoginRequest, RegisterRequest, ResourceKind};
use tracing::{debug, info, warn};

use crate::api::{
    AuthApi, DepartmentsApi, EmployeesApi, FilesApi, JobsApi, RolesApi, TranslationsApi, UsersApi,
};
use crate::auth::TokenStore;
use crate::cache::ResourceCache;
use crate::error::ApplicationResult;
use crate::gateway::HttpGateway;
use crate::ports::{Clock, KeyValueStore, Transport};
use crate::preferences::PreferencesService;
use crate::query::{ResourceClient, ttl};
use crate::session::{SessionConfig, SessionManager};

/// One console instance: session, cache and typed APIs wired over the given
/// ports.
///
/// Cloning yields another handle on the same instance.
#[derive(Clone)]
pub struct Console {
    session: SessionManager,
    cache: Arc<ResourceCache>,
    client: ResourceClient,
    preferences: PreferencesService,
}

impl Console {
    /// Wires a console over `transport`, `store` and `clock`. The console
    /// starts anonymous; call [`Self::start`] to pick up a stored session.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let cache = Arc::new(ResourceCache::new(Arc::clone(&clock)));
        let session = SessionManager::new(
            TokenStore::new(Arc::clone(&store)),
            Arc::clone(&cache),
            clock,
            config,
        );
        let gateway = Arc::new(HttpGateway::new(transport, session.clone()));
        Self {
            client: ResourceClient::new(gateway, Arc::clone(&cache)),
            preferences: PreferencesService::new(store, Arc::clone(&cache)),
            session,
            cache,
        }
    }

    /// Restores a stored session and starts following changes other
    /// contexts make to the store. Returns true if a session is running.
    ///
    /// # Errors
    /// Returns a storage error if the store cannot be read.
    pub async fn start(&self) -> ApplicationResult<bool> {
        let restored = self.session.restore().await?;
        self.session.watch_store();
        if restored {
            self.spawn_profile_load();
        }
        Ok(restored)
    }

    /// Logs in with e-mail and password. Returns the session generation.
    ///
    /// The profile is loaded in the background; watch for
    /// [`SessionEvent::ProfileLoaded`](steward_domain::SessionEvent::ProfileLoaded).
    ///
    /// # Errors
    /// Returns the backend error, or an error if the issued token is unusable
    /// or cannot be stored.
    pub async fn login(&self, email: &str, password: &str) -> ApplicationResult<u64> {
        let response = self
            .auth()
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.login_with_token(&response.token).await
    }

    /// Creates an account and logs into it.
    ///
    /// # Errors
    /// Same as [`Self::login`].
    pub async fn register(&self, registration: &RegisterRequest) -> ApplicationResult<u64> {
        let response = self.auth().register(registration).await?;
        self.login_with_token(&response.token).await
    }

    /// Starts a session from a token obtained elsewhere, e.g. an OAuth2
    /// callback.
    ///
    /// # Errors
    /// Returns an error if the token is unusable or cannot be stored.
    pub async fn login_with_token(&self, token: &str) -> ApplicationResult<u64> {
        let generation = self.session.login(token).await?;
        self.spawn_profile_load();
        Ok(generation)
    }

    /// Logs out: ends the local session, then tells the backend with the
    /// credential that session held. Returns true if a session was ended
    /// here; the backend's answer does not change that.
    pub async fn logout(&self) -> bool {
        let authorization = self.session.authorization().map(|(authorization, _)| authorization);
        let ended = self.session.logout().await;
        if ended
            && let Some(authorization) = authorization
            && let Err(e) = self.auth().logout(authorization).await
        {
            debug!(error = %e, "server-side logout failed");
        }
        ended
    }

    /// Fetches the logged-in user's profile and records it on the session.
    /// Returns false if the session changed while the profile was loading.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn load_profile(&self) -> ApplicationResult<bool> {
        let (user, generation) = self.auth().me_with_generation().await?;
        let value = serde_json::to_value(&user).ok();
        if !self.session.set_current_user(generation, user) {
            return Ok(false);
        }
        if let Some(value) = value {
            self.cache.set(
                CacheKey::singleton(ResourceKind::CurrentUser),
                value,
                ttl::CURRENT_USER,
            );
        }
        info!(generation, "profile loaded");
        Ok(true)
    }

    fn spawn_profile_load(&self) {
        let console = self.clone();
        tokio::spawn(async move {
            if let Err(e) = console.load_profile().await {
                warn!(error = %e, "could not load profile");
            }
        });
    }

    /// Stops background tasks.
    pub fn shutdown(&self) {
        self.session.shutdown();
    }

    /// The session.
    #[must_use]
    pub const fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The response cache.
    #[must_use]
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Theme and language.
    #[must_use]
    pub const fn preferences(&self) -> &PreferencesService {
        &self.preferences
    }

    /// Login, registration and the current user.
    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.client.clone())
    }

    /// `/users`.
    #[must_use]
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.client.clone())
    }

    /// `/employees`.
    #[must_use]
    pub fn employees(&self) -> EmployeesApi {
        EmployeesApi::new(self.client.clone())
    }

    /// `/departments`.
    #[must_use]
    pub fn departments(&self) -> DepartmentsApi {
        DepartmentsApi::new(self.client.clone())
    }

    /// `/jobs`.
    #[must_use]
    pub fn jobs(&self) -> JobsApi {
        JobsApi::new(self.client.clone())
    }

    /// `/roles`.
    #[must_use]
    pub fn roles(&self) -> RolesApi {
        RolesApi::new(self.client.clone())
    }

    /// `/files`.
    #[must_use]
    pub fn files(&self) -> FilesApi {
        FilesApi::new(self.client.clone())
    }

    /// `/translations`.
    #[must_use]
    pub fn translations(&self) -> TranslationsApi {
        TranslationsApi::new(self.client.clone())
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("session", &self.session)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
