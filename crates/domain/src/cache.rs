//! Structured cache keys.
//!
//! Every cached response is keyed by `(resource kind, qualifier)`. The
//! qualifier is either a single record id or the full set of list parameters
//! (pagination, filters, language), so two listings that differ in any
//! parameter never share an entry.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::resource::ResourceKind;

/// Parameters identifying one listing of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ListParams {
    /// Sub-listing such as `my-files`, `public`, `active` or `map`.
    pub view: Option<String>,
    /// Zero-based page index.
    pub page: Option<u32>,
    /// Page size.
    pub size: Option<u32>,
    /// Search keyword.
    pub keyword: Option<String>,
    /// Type filter (e.g. file type).
    pub type_filter: Option<String>,
    /// Language code.
    pub language: Option<String>,
}

impl ListParams {
    /// An unfiltered, unpaginated listing.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A paginated listing.
    #[must_use]
    pub fn paged(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
            ..Self::default()
        }
    }

    /// Sets the sub-listing.
    #[must_use]
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Sets the search keyword.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Sets the type filter.
    #[must_use]
    pub fn with_type_filter(mut self, type_filter: impl Into<String>) -> Self {
        self.type_filter = Some(type_filter.into());
        self
    }

    /// Sets the language code.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Query-string pairs for pagination and keyword, in a stable order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(keyword) = &self.keyword {
            pairs.push(("keyword", keyword.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size", size.to_string()));
        }
        pairs
    }
}

/// Second component of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Qualifier {
    /// The resource has a single value (e.g. the current user).
    Singleton,
    /// One record by id.
    Item {
        /// Record id.
        id: u64,
    },
    /// One listing.
    List(ListParams),
}

/// Key of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Resource kind.
    pub resource: ResourceKind,
    /// Which slice of the resource.
    pub qualifier: Qualifier,
}

impl CacheKey {
    /// Key of a single record.
    #[must_use]
    pub const fn item(resource: ResourceKind, id: u64) -> Self {
        Self {
            resource,
            qualifier: Qualifier::Item { id },
        }
    }

    /// Key of a listing.
    #[must_use]
    pub const fn list(resource: ResourceKind, params: ListParams) -> Self {
        Self {
            resource,
            qualifier: Qualifier::List(params),
        }
    }

    /// Key of a single-valued resource.
    #[must_use]
    pub const fn singleton(resource: ResourceKind) -> Self {
        Self {
            resource,
            qualifier: Qualifier::Singleton,
        }
    }

    /// Returns true if this key names a listing.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self.qualifier, Qualifier::List(_))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Qualifier::Singleton => write!(f, "{}", self.resource),
            Qualifier::Item { id } => write!(f, "{}/{id}", self.resource),
            Qualifier::List(params) => {
                let mut parts = Vec::new();
                if let Some(v) = &params.view {
                    parts.push(format!("view={v}"));
                }
                if let Some(v) = params.page {
                    parts.push(format!("page={v}"));
                }
                if let Some(v) = params.size {
                    parts.push(format!("size={v}"));
                }
                if let Some(v) = &params.keyword {
                    parts.push(format!("keyword={v}"));
                }
                if let Some(v) = &params.type_filter {
                    parts.push(format!("type={v}"));
                }
                if let Some(v) = &params.language {
                    parts.push(format!("lang={v}"));
                }
                write!(f, "{}[{}]", self.resource, parts.join(","))
            }
        }
    }
}

/// Selects a set of cache keys for invalidation or subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    /// Every key.
    All,
    /// Every key of a resource kind.
    Resource(ResourceKind),
    /// Every listing of a resource kind, whatever its parameters.
    Lists(ResourceKind),
    /// Every listing of a resource kind for one language.
    LanguageLists(ResourceKind, String),
    /// One exact key.
    Exact(CacheKey),
}

impl KeyPattern {
    /// Returns true if `key` is selected by this pattern.
    #[must_use]
    pub fn matches(&self, key: &CacheKey) -> bool {
        match self {
            Self::All => true,
            Self::Resource(kind) => key.resource == *kind,
            Self::Lists(kind) => key.resource == *kind && key.is_list(),
            Self::LanguageLists(kind, language) => {
                key.resource == *kind
                    && matches!(
                        &key.qualifier,
                        Qualifier::List(p) if p.language.as_deref() == Some(language.as_str())
                    )
            }
            Self::Exact(exact) => exact == key,
        }
    }
}

impl From<CacheKey> for KeyPattern {
    fn from(key: CacheKey) -> Self {
        Self::Exact(key)
    }
}
