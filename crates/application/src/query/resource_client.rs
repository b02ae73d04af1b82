//! Stale-while-revalidate queries and invalidating mutations.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use steward_domain::{ApiError, ApiRequest, CacheKey, KeyPattern, ResourceKind};
use tracing::{debug, trace};

use crate::cache::{CacheLookup, ResourceCache};
use crate::gateway::HttpGateway;

/// How a query treats cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Serve fresh entries without a request; serve stale entries at once
    /// and refresh them in the background.
    #[default]
    CacheFirst,
    /// Always ask the backend, then cache the answer.
    ForceFresh,
}

/// Query layer between the typed APIs and the gateway.
#[derive(Clone)]
pub struct ResourceClient {
    gateway: Arc<HttpGateway>,
    cache: Arc<ResourceCache>,
    refreshing: Arc<Mutex<HashSet<CacheKey>>>,
}

impl ResourceClient {
    /// Creates a client over `gateway` and `cache`.
    #[must_use]
    pub fn new(gateway: Arc<HttpGateway>, cache: Arc<ResourceCache>) -> Self {
        Self {
            gateway,
            cache,
            refreshing: Arc::default(),
        }
    }

    /// The underlying gateway.
    #[must_use]
    pub fn gateway(&self) -> &HttpGateway {
        &self.gateway
    }

    /// The underlying cache.
    #[must_use]
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Runs a cached query and decodes the answer.
    ///
    /// # Errors
    /// Returns the gateway's error, or [`ApiError::Decode`] if the data does
    /// not have the shape of `T`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        key: CacheKey,
        request: ApiRequest,
        ttl: Duration,
        policy: FetchPolicy,
    ) -> Result<T, ApiError> {
        decode(self.fetch_value(key, request, ttl, policy).await?)
    }

    /// Runs a cached query, returning the raw JSON.
    ///
    /// # Errors
    /// Returns the gateway's error when the backend has to be asked and fails.
    pub async fn fetch_value(
        &self,
        key: CacheKey,
        request: ApiRequest,
        ttl: Duration,
        policy: FetchPolicy,
    ) -> Result<Value, ApiError> {
        if policy == FetchPolicy::CacheFirst {
            match self.cache.get(&key) {
                CacheLookup::Fresh(value) => {
                    trace!(%key, "fresh cache hit");
                    return Ok(value);
                }
                CacheLookup::Stale(value) => {
                    self.spawn_refresh(key, request, ttl);
                    return Ok(value);
                }
                CacheLookup::Absent => {}
            }
        }
        self.load(&key, request, ttl).await
    }

    /// Sends a mutation, then invalidates what it made stale: the record
    /// itself, every listing of its kind and the kind's dependents.
    ///
    /// # Errors
    /// Returns the gateway's error (nothing is invalidated then), or
    /// [`ApiError::Decode`] if the answer does not have the shape of `T`.
    pub async fn mutate<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        kind: ResourceKind,
        id: Option<u64>,
    ) -> Result<T, ApiError> {
        let response = self.gateway.send(request).await?;
        self.invalidate_after_mutation(kind, id);
        decode(response.value)
    }

    /// Invalidates what a successful mutation of `kind` made stale. Returns
    /// the number of dropped entries.
    pub fn invalidate_after_mutation(&self, kind: ResourceKind, id: Option<u64>) -> usize {
        let mut dropped = 0;
        if let Some(id) = id {
            dropped += self
                .cache
                .invalidate(&KeyPattern::Exact(CacheKey::item(kind, id)));
        }
        dropped += self.cache.invalidate(&KeyPattern::Lists(kind));
        for dependent in kind.dependents() {
            dropped += self.cache.invalidate(&KeyPattern::Resource(*dependent));
        }
        debug!(%kind, ?id, dropped, "invalidated after mutation");
        dropped
    }

    /// Sends an uncached request and returns the raw body bytes.
    ///
    /// # Errors
    /// Returns the gateway's error.
    pub async fn download(&self, request: ApiRequest) -> Result<Vec<u8>, ApiError> {
        Ok(self.gateway.send_raw(request).await?.response.body)
    }

    /// Sends an uncached request and decodes its answer.
    ///
    /// # Errors
    /// Returns the gateway's error or a decode error.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        decode(self.gateway.send(request).await?.value)
    }

    async fn load(
        &self,
        key: &CacheKey,
        request: ApiRequest,
        ttl: Duration,
    ) -> Result<Value, ApiError> {
        let response = self.gateway.send(request).await?;
        let session = self.gateway.session();
        let cached = cache_for_generation(
            &self.cache,
            key,
            response.value.clone(),
            ttl,
            response.generation,
            || session.generation(),
        );
        if !cached {
            debug!(%key, "session changed while loading; answer not cached");
        }
        Ok(response.value)
    }

    fn spawn_refresh(&self, key: CacheKey, request: ApiRequest, ttl: Duration) {
        if !self.refreshing.lock().insert(key.clone()) {
            trace!(%key, "refresh already in flight");
            return;
        }
        debug!(%key, "serving stale entry, refreshing");

        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.load(&key, request, ttl).await {
                debug!(%key, error = %e, "background refresh failed");
            }
            client.refreshing.lock().remove(&key);
        });
    }
}

impl std::fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Caches `value` only while the session is still the one of `generation`.
///
/// A session end bumps the generation before it clears the cache, so a
/// second check after the write catches an end that slipped in between.
fn cache_for_generation(
    cache: &ResourceCache,
    key: &CacheKey,
    value: Value,
    ttl: Duration,
    generation: u64,
    current: impl Fn() -> u64,
) -> bool {
    if current() != generation {
        return false;
    }
    cache.set(key.clone(), value, ttl);
    if current() != generation {
        cache.invalidate(&KeyPattern::Exact(key.clone()));
        return false;
    }
    true
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::TokenStore;
    use crate::session::{SessionConfig, SessionManager};
    use crate::testing::{FakeTransport, ManualClock, MemoryStore, START};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use steward_domain::auth::encode_unsigned;
    use steward_domain::{HttpMethod, ListParams};

    const TTL: Duration = Duration::from_secs(120);

    struct Harness {
        client: ResourceClient,
        transport: Arc<FakeTransport>,
        clock: Arc<ManualClock>,
        session: SessionManager,
    }

    async fn harness() -> Harness {
        let clock = ManualClock::new();
        let cache = Arc::new(ResourceCache::new(clock.clone()));
        let session = SessionManager::new(
            TokenStore::new(Arc::new(MemoryStore::default())),
            cache.clone(),
            clock.clone(),
            SessionConfig::default(),
        );
        session
            .login(&encode_unsigned("admin@example.com", START + 86_400))
            .await
            .unwrap();
        let transport = FakeTransport::new();
        let gateway = Arc::new(HttpGateway::new(transport.clone(), session.clone()));
        Harness {
            client: ResourceClient::new(gateway, cache),
            transport,
            clock,
            session,
        }
    }

    fn users_key() -> CacheKey {
        CacheKey::list(ResourceKind::Users, ListParams::paged(0, 10))
    }

    fn users_request() -> ApiRequest {
        ApiRequest::get("/users").with_query([("page", "0"), ("size", "10")])
    }

    async fn list_users(h: &Harness, policy: FetchPolicy) -> Value {
        h.client
            .fetch_value(users_key(), users_request(), TTL, policy)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn fresh_entries_are_served_without_network() {
        let h = harness().await;
        h.transport
            .respond(HttpMethod::Get, "/users", 200, json!({"content": []}));

        list_users(&h, FetchPolicy::CacheFirst).await;
        list_users(&h, FetchPolicy::CacheFirst).await;

        assert_eq!(h.transport.count(HttpMethod::Get, "/users"), 1);
    }

    #[tokio::test]
    async fn force_fresh_always_asks_the_backend() {
        let h = harness().await;
        h.transport
            .respond(HttpMethod::Get, "/users", 200, json!({"content": []}));

        list_users(&h, FetchPolicy::CacheFirst).await;
        list_users(&h, FetchPolicy::ForceFresh).await;

        assert_eq!(h.transport.count(HttpMethod::Get, "/users"), 2);
    }

    #[tokio::test]
    async fn delete_invalidates_lists_so_next_read_hits_network() {
        let h = harness().await;
        h.transport
            .respond(HttpMethod::Get, "/users", 200, json!({"content": [{"id": 42}]}));
        h.transport
            .respond_bytes(HttpMethod::Delete, "/users/42", b"");
        h.client.cache().set(
            CacheKey::list(ResourceKind::Users, ListParams::paged(3, 50)),
            json!({}),
            TTL,
        );

        list_users(&h, FetchPolicy::CacheFirst).await;
        let _: Value = h
            .client
            .mutate(ApiRequest::delete("/users/42"), ResourceKind::Users, Some(42))
            .await
            .unwrap();

        assert_eq!(h.client.cache().get(&users_key()), CacheLookup::Absent);
        assert_eq!(
            h.client.cache().get(&CacheKey::list(
                ResourceKind::Users,
                ListParams::paged(3, 50)
            )),
            CacheLookup::Absent
        );
        list_users(&h, FetchPolicy::CacheFirst).await;
        assert_eq!(h.transport.count(HttpMethod::Get, "/users"), 2);
    }

    #[tokio::test]
    async fn failed_mutation_invalidates_nothing() {
        let h = harness().await;
        h.client.cache().set(users_key(), json!({}), TTL);
        h.transport
            .respond(HttpMethod::Delete, "/users/42", 404, json!({"message": "gone"}));

        let result: Result<Value, _> = h
            .client
            .mutate(ApiRequest::delete("/users/42"), ResourceKind::Users, Some(42))
            .await;

        assert!(matches!(result, Err(ApiError::NotFound { .. })));
        assert!(h.client.cache().get(&users_key()).is_fresh());
    }

    #[tokio::test]
    async fn role_mutation_invalidates_dependent_kinds() {
        let h = harness().await;
        let cache = h.client.cache();
        cache.set(CacheKey::singleton(ResourceKind::CurrentUser), json!({}), TTL);
        cache.set(CacheKey::item(ResourceKind::Users, 4), json!({}), TTL);
        cache.set(users_key(), json!({}), TTL);
        cache.set(
            CacheKey::list(ResourceKind::Jobs, ListParams::all()),
            json!([]),
            TTL,
        );

        let dropped = h.client.invalidate_after_mutation(ResourceKind::Roles, None);

        assert_eq!(dropped, 3);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_is_served_then_refreshed_once() {
        let h = harness().await;
        h.client.cache().set(users_key(), json!("old"), TTL);
        h.clock.advance(TTL + Duration::from_secs(1));
        h.transport.respond(HttpMethod::Get, "/users", 200, json!("new"));
        h.transport.delay(Duration::from_millis(100));

        assert_eq!(list_users(&h, FetchPolicy::CacheFirst).await, json!("old"));
        assert_eq!(list_users(&h, FetchPolicy::CacheFirst).await, json!("old"));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(h.transport.count(HttpMethod::Get, "/users"), 1);
        assert_eq!(
            h.client.cache().get(&users_key()),
            CacheLookup::Fresh(json!("new"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn answers_of_a_previous_session_are_not_cached() {
        let h = harness().await;
        h.transport
            .respond(HttpMethod::Get, "/users", 200, json!({"content": []}));
        h.transport.delay(Duration::from_secs(1));

        let client = h.client.clone();
        let pending = tokio::spawn(async move {
            client
                .fetch_value(users_key(), users_request(), TTL, FetchPolicy::CacheFirst)
                .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.session.logout().await;

        assert!(pending.await.unwrap().is_ok());
        assert!(h.client.cache().is_empty());
    }

    #[test]
    fn session_end_during_the_write_drops_the_entry() {
        let cache = ResourceCache::new(ManualClock::new());
        let reads = std::cell::Cell::new(0_u64);
        let current = || {
            reads.set(reads.get() + 1);
            if reads.get() == 1 { 4 } else { 5 }
        };

        let cached = cache_for_generation(&cache, &users_key(), json!({}), TTL, 4, current);

        assert!(!cached);
        assert_eq!(reads.get(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn unchanged_session_keeps_the_entry() {
        let cache = ResourceCache::new(ManualClock::new());

        assert!(cache_for_generation(&cache, &users_key(), json!([]), TTL, 4, || 4));
        assert!(cache.get(&users_key()).is_fresh());
    }

    #[tokio::test]
    async fn decode_errors_name_the_mismatch() {
        let h = harness().await;
        h.transport
            .respond(HttpMethod::Get, "/users", 200, json!({"content": "nope"}));

        let result: Result<steward_domain::Page<steward_domain::User>, _> = h
            .client
            .fetch(users_key(), users_request(), TTL, FetchPolicy::CacheFirst)
            .await;

        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
