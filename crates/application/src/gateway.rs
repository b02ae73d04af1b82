//! Single path for every backend call.
//!
//! The gateway decides per request whether the credential is attached,
//! refuses protected calls while anonymous, turns 401 answers into a session
//! teardown and normalizes every other failure into an [`ApiError`].

use std::sync::Arc;

use serde_json::Value;
use steward_domain::{ApiError, ApiRequest, ApiResponse, HttpMethod};
use tracing::{debug, warn};

use crate::ports::Transport;
use crate::session::SessionManager;

/// A successful JSON answer and the session generation it was requested in.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    /// Decoded body; `null` for empty bodies.
    pub value: Value,
    /// Session generation at send time.
    pub generation: u64,
}

/// A successful raw answer, for downloads.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The response as received.
    pub response: ApiResponse,
    /// Session generation at send time.
    pub generation: u64,
}

/// Wraps the [`Transport`] with credential handling and error normalization.
pub struct HttpGateway {
    transport: Arc<dyn Transport>,
    session: SessionManager,
}

impl HttpGateway {
    /// Creates a gateway sending through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, session: SessionManager) -> Self {
        Self { transport, session }
    }

    /// Sends a JSON request and returns the decoded body.
    ///
    /// # Errors
    /// See [`Self::send`].
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let mut request = ApiRequest::new(method, path);
        if let Some(body) = body {
            request = request.with_json(body);
        }
        Ok(self.send(request).await?.value)
    }

    /// Sends `request` and decodes the JSON answer.
    ///
    /// # Errors
    /// - [`ApiError::Unauthenticated`] for a protected call while anonymous;
    ///   the transport is not touched.
    /// - [`ApiError::Unauthorized`] after the backend answered 401; the
    ///   session has been ended by then.
    /// - Any other normalized backend or network error.
    pub async fn send(&self, request: ApiRequest) -> Result<GatewayResponse, ApiError> {
        let raw = self.send_raw(request).await?;
        Ok(GatewayResponse {
            value: raw.response.decode()?,
            generation: raw.generation,
        })
    }

    /// Sends `request` and returns the successful answer undecoded.
    ///
    /// # Errors
    /// Same as [`Self::send`], minus decode errors.
    pub async fn send_raw(&self, mut request: ApiRequest) -> Result<RawResponse, ApiError> {
        let protected = request.class().is_protected();

        let generation = if protected {
            let Some((authorization, generation)) = self.session.authorization() else {
                debug!(
                    method = %request.method,
                    path = %request.path,
                    "blocked protected call without credential"
                );
                return Err(ApiError::Unauthenticated);
            };
            request.authorization = Some(authorization);
            generation
        } else {
            request.authorization = None;
            self.session.generation()
        };

        debug!(method = %request.method, path = %request.path, protected, "sending request");
        let response = match self.transport.execute(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %request.method, path = %request.path, error = %e, "request failed");
                return Err(e.into());
            }
        };

        let status = response.status;
        if status.is_unauthorized() {
            warn!(method = %request.method, path = %request.path, "backend rejected credential");
            self.session.on_unauthorized_at(generation).await;
            return Err(response.into_error());
        }
        if !status.is_success() {
            let error = response.into_error();
            debug!(
                method = %request.method,
                path = %request.path,
                %status,
                %error,
                "request rejected"
            );
            return Err(error);
        }

        debug!(method = %request.method, path = %request.path, %status, "request succeeded");
        Ok(RawResponse {
            response,
            generation,
        })
    }

    /// Sends `request` with an `Authorization` value captured earlier. The
    /// session is left alone whatever the answer, 401 included.
    ///
    /// # Errors
    /// Any normalized backend or network error.
    pub async fn send_detached(
        &self,
        mut request: ApiRequest,
        authorization: String,
    ) -> Result<Value, ApiError> {
        request.authorization = Some(authorization);
        debug!(method = %request.method, path = %request.path, "sending detached request");
        let response = self.transport.execute(&request).await?;
        if !response.status.is_success() {
            return Err(response.into_error());
        }
        response.decode()
    }

    /// The session this gateway reports 401s to.
    #[must_use]
    pub const fn session(&self) -> &SessionManager {
        &self.session
    }
}
