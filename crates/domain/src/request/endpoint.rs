//! Protected/public classification of backend endpoints.

use super::HttpMethod;

/// Whether an endpoint needs a bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    /// Reachable anonymously; the credential is never attached.
    Public,
    /// Requires the credential; calls without one are refused locally.
    Protected,
}

/// Anonymous write endpoints: the ones that produce a credential.
const PUBLIC_WRITES: &[&str] = &["/auth/login", "/auth/register"];

/// Prefixes readable anonymously: translation lookups, the shared file
/// listings and the OAuth2 authorize/callback redirects.
const PUBLIC_READ_PREFIXES: &[&str] = &[
    "/translations",
    "/files/public",
    "/files/all",
    "/files/search",
    "/files/type",
    "/files/recent",
    "/auth/oauth2/",
];

impl EndpointClass {
    /// Classifies `path` (relative to the API base, query string allowed).
    #[must_use]
    pub fn classify(method: HttpMethod, path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');

        let public = match method {
            HttpMethod::Post => PUBLIC_WRITES.contains(&path),
            HttpMethod::Get => PUBLIC_READ_PREFIXES
                .iter()
                .any(|prefix| path_has_prefix(path, prefix)),
            HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete => false,
        };

        if public { Self::Public } else { Self::Protected }
    }

    /// Returns true for protected endpoints.
    #[must_use]
    pub const fn is_protected(self) -> bool {
        matches!(self, Self::Protected)
    }
}

/// Segment-aware prefix check: `/files/public` matches `/files/public/3`
/// but not `/files/publicity`.
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    if prefix.ends_with('/') {
        return path.starts_with(prefix);
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
