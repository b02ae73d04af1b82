//! Bearer credential and decoded claims.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while decoding the claims of a bearer token.
///
/// Any of these means the token cannot be trusted and must be discarded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    /// The token does not have the `header.payload.signature` shape.
    #[error("token is not a three-part JWT")]
    Malformed,

    /// The payload segment is not valid base64url.
    #[error("token payload is not valid base64url")]
    Encoding,

    /// The payload is not a JSON object with the expected fields.
    #[error("token payload is not valid JSON: {0}")]
    Payload(String),

    /// Neither `sub` nor `email` is present.
    #[error("token has no subject")]
    MissingSubject,

    /// No `exp` claim is present.
    #[error("token has no expiry")]
    MissingExpiry,
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Metadata embedded in a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identity the token was issued to (the user's e-mail on this backend).
    pub subject: String,
    /// Expiry as seconds since the Unix epoch.
    pub expiry: i64,
}

impl Claims {
    /// Decodes the claims carried by `token`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClaimsError`] when the token is not a JWT, the payload
    /// cannot be decoded, or the subject/expiry claims are missing.
    pub fn decode(token: &str) -> Result<Self, ClaimsError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
            _ => return Err(ClaimsError::Malformed),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| ClaimsError::Encoding)?;
        let raw: RawClaims =
            serde_json::from_slice(&bytes).map_err(|e| ClaimsError::Payload(e.to_string()))?;

        let subject = raw
            .sub
            .or(raw.email)
            .filter(|s| !s.is_empty())
            .ok_or(ClaimsError::MissingSubject)?;
        let expiry = raw.exp.ok_or(ClaimsError::MissingExpiry)?;

        Ok(Self { subject, expiry })
    }

    /// Returns the expiry as a UTC timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.expiry, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Returns true once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expiry
    }

    /// Seconds left before expiry, negative once expired.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        self.expiry - now.timestamp()
    }
}

/// A bearer token together with its decoded claims.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    claims: Claims,
}

impl Credential {
    /// Parses a raw bearer token.
    ///
    /// # Errors
    ///
    /// Returns a [`ClaimsError`] if the claims cannot be decoded.
    pub fn parse(token: impl Into<String>) -> Result<Self, ClaimsError> {
        let token = token.into();
        let claims = Claims::decode(&token)?;
        Ok(Self { token, claims })
    }

    /// The raw bearer string.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The decoded claims.
    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Shortcut for the claims subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.claims.subject
    }

    /// Returns the `Authorization` header value.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Get a preview of the token (first 8 chars + ...) for logs.
    #[must_use]
    pub fn preview(&self) -> String {
        if self.token.chars().count() > 12 {
            let head: String = self.token.chars().take(8).collect();
            format!("{head}...")
        } else {
            self.token.clone()
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &self.preview())
            .field("claims", &self.claims)
            .finish()
    }
}

/// Builds an unsigned JWT with the given claims, for tests and fixtures.
#[must_use]
pub fn encode_unsigned(subject: &str, expiry: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::json!({ "sub": subject, "exp": expiry, "iat": expiry - 3600 });
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}
