//! Outbound request types.

mod endpoint;
mod method;

pub use endpoint::EndpointClass;
pub use method::HttpMethod;

use serde_json::Value;

use crate::resource::FileUpload;

/// Body of an outbound request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// A JSON document, sent as `application/json`.
    Json(Value),
    /// A file upload, sent as `multipart/form-data`.
    Multipart(FileUpload),
}

impl RequestBody {
    /// The `Content-Type` the body is sent with; multipart bodies get theirs
    /// (with boundary) from the transport.
    #[must_use]
    pub const fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Json(_) => Some("application/json"),
            Self::Empty | Self::Multipart(_) => None,
        }
    }
}

/// A request addressed to the backend, relative to its base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path below the base URL, starting with `/`.
    pub path: String,
    /// Query-string pairs.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
    /// `Authorization` header value, set by the gateway for protected paths.
    pub authorization: Option<String>,
}

impl ApiRequest {
    /// Creates a request without query or body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            authorization: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_json(body)
    }

    /// Creates a PUT request with a JSON body.
    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, path).with_json(body)
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Sets a multipart upload body.
    #[must_use]
    pub fn with_upload(mut self, upload: FileUpload) -> Self {
        self.body = RequestBody::Multipart(upload);
        self
    }

    /// Appends query-string pairs.
    #[must_use]
    pub fn with_query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// How the gateway treats this request.
    #[must_use]
    pub fn class(&self) -> EndpointClass {
        EndpointClass::classify(self.method, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_query_pairs() {
        let request = ApiRequest::get("/users").with_query([("page", "0"), ("size", "10")]);
        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "0".to_string()),
                ("size".to_string(), "10".to_string())
            ]
        );
        assert!(request.authorization.is_none());
    }

    #[test]
    fn json_bodies_declare_content_type() {
        let request = ApiRequest::post("/users", serde_json::json!({"name": "Ann"}));
        assert_eq!(request.body.content_type(), Some("application/json"));
        assert_eq!(ApiRequest::get("/users").body.content_type(), None);
    }
}
