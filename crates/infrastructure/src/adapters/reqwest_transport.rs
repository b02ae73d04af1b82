//! HTTP transport using reqwest.
//!
//! This adapter implements the `Transport` port. It resolves request paths
//! against the backend base URL and hands every HTTP answer, errors included,
//! back to the gateway unclassified.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Url};
use steward_application::ports::{Transport, TransportError};
use steward_domain::{ApiRequest, ApiResponse, FileUpload, HttpMethod, RequestBody};
use tracing::trace;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`Transport`] over a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport for the backend at `base_url`, e.g.
    /// `http://localhost:8080/api`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the client cannot be
    /// created.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("Steward/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Self::with_client(client, base_url, timeout)
    }

    /// Creates a transport over an existing client.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_client(
        client: Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {base_url}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(format!("not a base URL: {base_url}")));
        }
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The backend base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Appends `path` to the base URL's path and adds the query pairs.
    fn resolve(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = request.path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{base}/{path}"))
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {}", request.path)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    fn multipart_form(upload: &FileUpload) -> Result<Form, TransportError> {
        let part = Part::bytes(upload.contents.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload_mime(upload))
            .map_err(|e| TransportError::InvalidBody(e.to_string()))?;
        Ok(Form::new()
            .part("file", part)
            .text("description", upload.description.clone())
            .text("isPublic", upload.is_public.to_string()))
    }

    fn build_body(
        builder: reqwest::RequestBuilder,
        body: &RequestBody,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        match body {
            RequestBody::Empty => Ok(builder),
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value)
                    .map_err(|e| TransportError::InvalidBody(format!("Invalid JSON: {e}")))?;
                Ok(builder
                    .header(reqwest::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                    .body(bytes))
            }
            RequestBody::Multipart(upload) => Ok(builder.multipart(Self::multipart_form(upload)?)),
        }
    }

    fn map_error(&self, error: &reqwest::Error) -> TransportError {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }

        let host = || {
            error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string()
        };
        if error.is_connect() {
            let message = error.to_string();
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return TransportError::DnsError {
                    host: host(),
                    message,
                };
            }
            if lower.contains("refused") {
                return TransportError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        TransportError::Other(error.to_string())
    }
}

/// MIME type of an upload: the declared one, else guessed from the file name.
fn upload_mime(upload: &FileUpload) -> String {
    upload.mime_type.clone().unwrap_or_else(|| {
        mime_guess::from_path(&upload.file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    })
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(request)?;
        trace!(method = %request.method, %url, "http request");

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(self.timeout)
            .header(reqwest::header::ACCEPT, mime::APPLICATION_JSON.as_ref());
        if let Some(authorization) = &request.authorization {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization);
        }
        builder = Self::build_body(builder, &request.body)?;

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_ascii_lowercase(),
                    v.to_str().unwrap_or("<binary>").to_string(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Other(format!("Failed to read body: {e}")))?
            .to_vec();

        trace!(status, bytes = body.len(), "http response");
        let mut api_response = ApiResponse::new(status, body);
        api_response.headers = headers;
        Ok(api_response)
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn transport(base: &str) -> ReqwestTransport {
        ReqwestTransport::new(base, DEFAULT_TIMEOUT).unwrap()
    }

    fn upload(name: &str, mime_type: Option<&str>) -> FileUpload {
        FileUpload {
            file_name: name.to_string(),
            contents: vec![1, 2, 3],
            mime_type: mime_type.map(str::to_string),
            description: String::new(),
            is_public: false,
        }
    }

    #[test]
    fn maps_every_method() {
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Get), Method::GET);
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Patch), Method::PATCH);
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Delete), Method::DELETE);
    }

    #[test]
    fn resolves_below_the_base_path() {
        for base in ["http://localhost:8080/api", "http://localhost:8080/api/"] {
            let url = transport(base)
                .resolve(&ApiRequest::get("/users").with_query([("page", "0"), ("size", "10")]))
                .unwrap();
            assert_eq!(url.as_str(), "http://localhost:8080/api/users?page=0&size=10");
        }
    }

    #[test]
    fn encodes_query_values() {
        let url = transport("https://console.example.com/api")
            .resolve(&ApiRequest::get("/files/search").with_query([("keyword", "q3 report&co")]))
            .unwrap();
        assert_eq!(url.query(), Some("keyword=q3+report%26co"));
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = ReqwestTransport::new("not a url", DEFAULT_TIMEOUT);
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
        let result = ReqwestTransport::new("mailto:ops@example.com", DEFAULT_TIMEOUT);
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn guesses_upload_mime_from_name() {
        assert_eq!(upload_mime(&upload("report.pdf", None)), "application/pdf");
        assert_eq!(upload_mime(&upload("blob", None)), "application/octet-stream");
        assert_eq!(upload_mime(&upload("a.bin", Some("image/png"))), "image/png");
    }

    #[test]
    fn builds_json_and_multipart_bodies() {
        let client = Client::new();
        let json_body = RequestBody::Json(json!({"email": "ann@example.com"}));
        assert!(
            ReqwestTransport::build_body(client.post("https://example.com"), &json_body).is_ok()
        );

        let multipart = RequestBody::Multipart(upload("notes.txt", None));
        assert!(
            ReqwestTransport::build_body(client.post("https://example.com"), &multipart).is_ok()
        );

        let bad_mime = RequestBody::Multipart(upload("x", Some("not a mime")));
        assert!(matches!(
            ReqwestTransport::build_body(client.post("https://example.com"), &bad_mime),
            Err(TransportError::InvalidBody(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let transport =
            ReqwestTransport::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        let result = transport.execute(&ApiRequest::get("/users")).await;
        assert!(result.is_err());
    }
}
