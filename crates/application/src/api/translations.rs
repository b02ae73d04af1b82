//! `/translations`
//!
//! Lookups (`map`, `languages`, listings and search) are public; edits need a
//! session. Maps and per-language listings are keyed by language so that a
//! locale switch can drop exactly one language.

use std::collections::HashMap;

use serde::Serialize;
use steward_domain::{
    ApiError, ApiRequest, BulkTranslationResult, CacheKey, ListParams, NewTranslation,
    ResourceKind, Translation,
};

use super::crud::Collection;
use super::json_body;
use crate::query::{FetchPolicy, ResourceClient, ttl};

const KIND: ResourceKind = ResourceKind::Translations;

/// Translation strings and the languages they exist in.
#[derive(Debug, Clone)]
pub struct TranslationsApi {
    translations: Collection,
}

impl TranslationsApi {
    /// Creates the API over `client`.
    #[must_use]
    pub const fn new(client: ResourceClient) -> Self {
        Self {
            translations: Collection::new(client, KIND, ttl::DEFAULT_LIST),
        }
    }

    /// `key -> text` for one language.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn map(
        &self,
        language: &str,
        policy: FetchPolicy,
    ) -> Result<HashMap<String, String>, ApiError> {
        let key = CacheKey::list(KIND, ListParams::all().with_view("map").with_language(language));
        let request = ApiRequest::get(self.translations.path(format!("language/{language}/map")));
        self.translations
            .client()
            .fetch(key, request, ttl::TRANSLATION_MAP, policy)
            .await
    }

    /// Codes of every language that has translations.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn languages(&self, policy: FetchPolicy) -> Result<Vec<String>, ApiError> {
        let kind = ResourceKind::Languages;
        self.translations
            .client()
            .fetch(
                CacheKey::singleton(kind),
                ApiRequest::get(kind.base_path()),
                ttl::LANGUAGES,
                policy,
            )
            .await
    }

    /// Every translation record.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn list(&self, policy: FetchPolicy) -> Result<Vec<Translation>, ApiError> {
        self.translations.list(ListParams::all(), policy).await
    }

    /// Translation records of one language.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn by_language(
        &self,
        language: &str,
        policy: FetchPolicy,
    ) -> Result<Vec<Translation>, ApiError> {
        let params = ListParams::all()
            .with_view(format!("language/{language}"))
            .with_language(language);
        self.translations.list(params, policy).await
    }

    /// Records whose key or text matches `keyword`.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn search(
        &self,
        keyword: &str,
        policy: FetchPolicy,
    ) -> Result<Vec<Translation>, ApiError> {
        let params = ListParams::all().with_view("search").with_keyword(keyword);
        self.translations.list(params, policy).await
    }

    /// One record by id.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn get(&self, id: u64, policy: FetchPolicy) -> Result<Translation, ApiError> {
        self.translations.get(id, policy).await
    }

    /// Creates a record.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn create(&self, translation: &NewTranslation) -> Result<Translation, ApiError> {
        self.translations.create(translation).await
    }

    /// Updates a record.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        id: u64,
        translation: &B,
    ) -> Result<Translation, ApiError> {
        self.translations.update(id, translation).await
    }

    /// Deletes a record.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.translations.delete(id).await
    }

    /// Imports many records at once; existing key/language pairs are skipped
    /// by the backend.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn bulk_create(
        &self,
        translations: &[NewTranslation],
    ) -> Result<BulkTranslationResult, ApiError> {
        let request = ApiRequest::post(self.translations.path("bulk"), json_body(translations)?);
        self.translations.client().mutate(request, KIND, None).await
    }
}
