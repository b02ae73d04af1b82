//! `/auth`

use serde_json::Value;
use steward_domain::{
    ApiError, ApiRequest, AuthResponse, CacheKey, HttpMethod, LoginRequest, OAuthAuthorization,
    RegisterRequest, ResourceKind, User,
};

use super::json_body;
use crate::gateway::GatewayResponse;
use crate::query::{FetchPolicy, ResourceClient, ttl};

/// Authentication endpoints. These never touch the session; the
/// [`Console`](crate::Console) turns their answers into session transitions.
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ResourceClient,
}

impl AuthApi {
    /// Creates the API over `client`.
    #[must_use]
    pub const fn new(client: ResourceClient) -> Self {
        Self { client }
    }

    /// Exchanges e-mail and password for a token.
    ///
    /// # Errors
    /// Returns the backend error, e.g. [`ApiError::Unauthorized`] for bad
    /// credentials.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.client
            .send(ApiRequest::post("/auth/login", json_body(credentials)?))
            .await
    }

    /// Creates an account and returns its token.
    ///
    /// # Errors
    /// Returns the backend error; validation failures carry field errors.
    pub async fn register(&self, registration: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.client
            .send(ApiRequest::post("/auth/register", json_body(registration)?))
            .await
    }

    /// Tells the backend the session holding `authorization` is over. The
    /// answer never ends a local session.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn logout(&self, authorization: String) -> Result<(), ApiError> {
        let request = ApiRequest::new(HttpMethod::Post, "/auth/logout");
        let _: Value = self
            .client
            .gateway()
            .send_detached(request, authorization)
            .await?;
        Ok(())
    }

    /// The logged-in user's profile, cached.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn me(&self, policy: FetchPolicy) -> Result<User, ApiError> {
        let kind = ResourceKind::CurrentUser;
        self.client
            .fetch(
                CacheKey::singleton(kind),
                ApiRequest::get(kind.base_path()),
                ttl::CURRENT_USER,
                policy,
            )
            .await
    }

    /// Fetches the profile bypassing the cache, together with the session
    /// generation the request was sent in.
    ///
    /// # Errors
    /// Returns the backend error or a decode error.
    pub async fn me_with_generation(&self) -> Result<(User, u64), ApiError> {
        let GatewayResponse { value, generation } = self
            .client
            .gateway()
            .send(ApiRequest::get(ResourceKind::CurrentUser.base_path()))
            .await?;
        let user = serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok((user, generation))
    }

    /// Provider page to start an OAuth2 login, e.g. for `google` or `github`.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn oauth2_authorization(
        &self,
        provider: &str,
    ) -> Result<OAuthAuthorization, ApiError> {
        self.client
            .send(ApiRequest::get(format!("/auth/oauth2/{provider}/authorize")))
            .await
    }
}
