//! Shared create/read/update/delete plumbing for plain collections.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use steward_domain::{ApiError, ApiRequest, CacheKey, ListParams, ResourceKind};

use super::json_body;
use crate::query::{FetchPolicy, ResourceClient, ttl};

/// A REST collection at `kind.base_path()`.
#[derive(Debug, Clone)]
pub(super) struct Collection {
    client: ResourceClient,
    kind: ResourceKind,
    list_ttl: Duration,
}

impl Collection {
    pub(super) const fn new(
        client: ResourceClient,
        kind: ResourceKind,
        list_ttl: Duration,
    ) -> Self {
        Self {
            client,
            kind,
            list_ttl,
        }
    }

    pub(super) const fn client(&self) -> &ResourceClient {
        &self.client
    }

    pub(super) fn path(&self, suffix: impl std::fmt::Display) -> String {
        format!("{}/{suffix}", self.kind.base_path())
    }

    /// `GET base[/view]?keyword&page&size`, cached under the full parameters.
    pub(super) async fn list<T: DeserializeOwned>(
        &self,
        params: ListParams,
        policy: FetchPolicy,
    ) -> Result<T, ApiError> {
        let path = params
            .view
            .as_deref()
            .map_or_else(|| self.kind.base_path().to_string(), |view| self.path(view));
        let request = ApiRequest::get(path).with_query(params.query_pairs());
        self.client
            .fetch(CacheKey::list(self.kind, params), request, self.list_ttl, policy)
            .await
    }

    pub(super) async fn get<T: DeserializeOwned>(
        &self,
        id: u64,
        policy: FetchPolicy,
    ) -> Result<T, ApiError> {
        self.client
            .fetch(
                CacheKey::item(self.kind, id),
                ApiRequest::get(self.path(id)),
                ttl::SINGLE_RECORD,
                policy,
            )
            .await
    }

    pub(super) async fn create<T, B>(&self, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = ApiRequest::post(self.kind.base_path(), json_body(body)?);
        self.client.mutate(request, self.kind, None).await
    }

    pub(super) async fn update<T, B>(&self, id: u64, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = ApiRequest::put(self.path(id), json_body(body)?);
        self.client.mutate(request, self.kind, Some(id)).await
    }

    pub(super) async fn delete(&self, id: u64) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .mutate(ApiRequest::delete(self.path(id)), self.kind, Some(id))
            .await?;
        Ok(())
    }
}
