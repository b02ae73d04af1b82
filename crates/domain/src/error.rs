//! Error taxonomy for backend calls and normalization of backend error bodies.
//!
//! The backend answers errors in several shapes: a plain string, `{message}`,
//! `{error}`, or `{message, fieldErrors: [{field, message}]}`. They are parsed
//! into [`ErrorPayload`] first and then classified by status into [`ApiError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::response::StatusCode;

/// A per-field validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as the backend reports it.
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

/// Broad category of an [`ApiError`], for UI messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No credential for a protected call.
    Unauthenticated,
    /// The backend answered 401.
    Unauthorized,
    /// The backend rejected the input.
    Validation,
    /// The resource does not exist.
    NotFound,
    /// Any other 4xx.
    Rejected,
    /// 5xx.
    Server,
    /// Transport failure.
    Network,
    /// A success body could not be decoded.
    Decode,
}

/// Error returned by every backend call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A protected endpoint was called without a credential; nothing was sent.
    #[error("not authenticated")]
    Unauthenticated,

    /// The backend rejected the credential.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Message for display.
        message: String,
    },

    /// The backend rejected the input.
    #[error("validation failed: {message}")]
    Validation {
        /// Summary message.
        message: String,
        /// Per-field messages, possibly empty.
        field_errors: Vec<FieldError>,
    },

    /// The resource does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// Message for display.
        message: String,
    },

    /// Another 4xx answer, e.g. 403 or 409.
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Message for display.
        message: String,
    },

    /// A 5xx answer.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status.
        status: u16,
        /// Message for display.
        message: String,
    },

    /// The request never got an HTTP answer.
    #[error("network error: {0}")]
    Network(String),

    /// A success body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classifies a non-success response.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let payload = ErrorPayload::parse(body);
        let fallback = StatusCode::new(status).reason_phrase();

        match status {
            401 => Self::Unauthorized {
                message: payload
                    .message()
                    .unwrap_or("Session expired. Please login again.")
                    .to_string(),
            },
            404 => Self::NotFound {
                message: payload.message().unwrap_or(fallback).to_string(),
            },
            400..=499 if payload.has_field_errors() || matches!(status, 400 | 422) => {
                let message = payload.message().unwrap_or(fallback).to_string();
                Self::Validation {
                    message,
                    field_errors: payload.into_field_errors(),
                }
            }
            500..=599 => Self::Server {
                status,
                message: payload.message().unwrap_or(fallback).to_string(),
            },
            _ => Self::Rejected {
                status,
                message: payload.message().unwrap_or(fallback).to_string(),
            },
        }
    }

    /// Broad category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::Server { .. } => ErrorKind::Server,
            Self::Network(_) => ErrorKind::Network,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Returns true for errors that end the session.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Per-field messages, empty unless this is a validation error.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation { field_errors, .. } => field_errors,
            _ => &[],
        }
    }
}

/// Shapes of error bodies sent by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    /// No body.
    Empty,
    /// A plain string (raw text or a JSON string).
    Text(String),
    /// `{"message": "..."}`.
    Message(String),
    /// `{"error": "..."}`.
    Error(String),
    /// `{"message": "...", "fieldErrors": [...]}`.
    Detailed {
        /// Summary message, if any.
        message: Option<String>,
        /// Per-field messages.
        field_errors: Vec<FieldError>,
    },
}

impl ErrorPayload {
    /// Parses an error body. Never fails: unknown shapes become [`Self::Text`].
    #[must_use]
    pub fn parse(body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }

        let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
            return Self::Text(trimmed.to_string());
        };

        match value {
            Value::String(s) => Self::Text(s),
            Value::Object(map) => {
                let string_field = |name: &str| {
                    map.get(name)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                };
                let message = string_field("message");
                let error = string_field("error");

                if let Some(Value::Array(items)) = map.get("fieldErrors") {
                    let field_errors = items
                        .iter()
                        .filter_map(|item| serde_json::from_value::<FieldError>(item.clone()).ok())
                        .collect();
                    return Self::Detailed {
                        message: message.or(error),
                        field_errors,
                    };
                }

                match (message, error) {
                    (Some(message), _) => Self::Message(message),
                    (None, Some(error)) => Self::Error(error),
                    (None, None) => Self::Text(trimmed.to_string()),
                }
            }
            _ => Self::Text(trimmed.to_string()),
        }
    }

    /// Best display message carried by the payload.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Text(s) | Self::Message(s) | Self::Error(s) => Some(s),
            Self::Detailed { message, .. } => message.as_deref(),
        }
    }

    /// Returns true if the payload lists field errors.
    #[must_use]
    pub fn has_field_errors(&self) -> bool {
        matches!(self, Self::Detailed { field_errors, .. } if !field_errors.is_empty())
    }

    /// Consumes the payload, returning its field errors.
    #[must_use]
    pub fn into_field_errors(self) -> Vec<FieldError> {
        match self {
            Self::Detailed { field_errors, .. } => field_errors,
            _ => Vec::new(),
        }
    }
}

/// Domain-level errors for local validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A locale code is not supported.
    #[error("unsupported locale: {0}")]
    UnsupportedLocale(String),

    /// A theme name is not supported.
    #[error("unsupported theme: {0}")]
    UnsupportedTheme(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_all_payload_shapes() {
        assert_eq!(ErrorPayload::parse(b""), ErrorPayload::Empty);
        assert_eq!(
            ErrorPayload::parse(b"Bad things"),
            ErrorPayload::Text("Bad things".to_string())
        );
        assert_eq!(
            ErrorPayload::parse(br#""quoted""#),
            ErrorPayload::Text("quoted".to_string())
        );
        assert_eq!(
            ErrorPayload::parse(br#"{"message":"Email taken"}"#),
            ErrorPayload::Message("Email taken".to_string())
        );
        assert_eq!(
            ErrorPayload::parse(br#"{"error":"Forbidden"}"#),
            ErrorPayload::Error("Forbidden".to_string())
        );
        assert_eq!(
            ErrorPayload::parse(concat!(
                r#"{"message":"Validation failed","#,
                r#""fieldErrors":[{"field":"email","message":"must be valid"}]}"#
            ).as_bytes()),
            ErrorPayload::Detailed {
                message: Some("Validation failed".to_string()),
                field_errors: vec![FieldError {
                    field: "email".to_string(),
                    message: "must be valid".to_string()
                }],
            }
        );
    }

    #[test]
    fn spring_error_prefers_message_over_error() {
        let body =
            br#"{"status":403,"error":"Forbidden","message":"Admins only","path":"/api/users"}"#;
        assert_eq!(
            ErrorPayload::parse(body),
            ErrorPayload::Message("Admins only".to_string())
        );
    }

    #[test]
    fn odd_shapes_do_not_fail() {
        assert_eq!(ErrorPayload::parse(b"[1,2]"), ErrorPayload::Text("[1,2]".to_string()));
        assert_eq!(ErrorPayload::parse(b"{}"), ErrorPayload::Text("{}".to_string()));
        let payload = ErrorPayload::parse(br#"{"fieldErrors":[{"field":1}]}"#);
        assert_eq!(
            payload,
            ErrorPayload::Detailed {
                message: None,
                field_errors: vec![]
            }
        );
    }

    #[test]
    fn classifies_by_status() {
        assert_eq!(
            ApiError::from_response(401, b"").kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            ApiError::from_response(404, br#"{"message":"User not found"}"#),
            ApiError::NotFound {
                message: "User not found".to_string()
            }
        );
        assert_eq!(
            ApiError::from_response(403, b"").kind(),
            ErrorKind::Rejected
        );
        assert_eq!(
            ApiError::from_response(503, b"down"),
            ApiError::Server {
                status: 503,
                message: "down".to_string()
            }
        );
    }

    #[test]
    fn field_errors_make_validation_errors() {
        let err = ApiError::from_response(
            409,
            br#"{"message":"Invalid","fieldErrors":[{"field":"phone","message":"taken"}]}"#,
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].field, "phone");

        let plain = ApiError::from_response(422, br#"{"error":"Unprocessable Entity"}"#);
        assert_eq!(plain.kind(), ErrorKind::Validation);
        assert!(plain.field_errors().is_empty());
    }
}
