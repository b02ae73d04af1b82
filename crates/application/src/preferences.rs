//! Persisted display preferences.

use std::sync::Arc;

use steward_domain::{
    KeyPattern, LANGUAGE_KEY, Locale, Preferences, ResourceKind, THEME_KEY, ThemeMode,
};
use tracing::{debug, info};

use crate::cache::ResourceCache;
use crate::error::ApplicationResult;
use crate::ports::KeyValueStore;

/// Reads and writes the `theme` and `language` keys.
///
/// Switching the locale also drops the cached translation data of the new
/// language, so the next lookup fetches it again.
#[derive(Clone)]
pub struct PreferencesService {
    store: Arc<dyn KeyValueStore>,
    cache: Arc<ResourceCache>,
}

impl PreferencesService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, cache: Arc<ResourceCache>) -> Self {
        Self { store, cache }
    }

    /// Loads the stored preferences. Unknown or missing values fall back to
    /// the defaults.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn load(&self) -> ApplicationResult<Preferences> {
        let theme = self.store.get(THEME_KEY).await?;
        let language = self.store.get(LANGUAGE_KEY).await?;
        Ok(Preferences::from_stored(theme.as_deref(), language.as_deref()))
    }

    /// Persists `theme`.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub async fn set_theme(&self, theme: ThemeMode) -> ApplicationResult<()> {
        self.store.set(THEME_KEY, theme.as_str()).await?;
        debug!(%theme, "theme saved");
        Ok(())
    }

    /// Flips between light and dark and returns the new mode.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written.
    pub async fn toggle_theme(&self) -> ApplicationResult<ThemeMode> {
        let theme = self.load().await?.theme.toggled();
        self.set_theme(theme).await?;
        Ok(theme)
    }

    /// Persists `locale` and drops its cached translations.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub async fn set_locale(&self, locale: Locale) -> ApplicationResult<()> {
        self.store.set(LANGUAGE_KEY, locale.code()).await?;
        let dropped = self.cache.invalidate(&KeyPattern::LanguageLists(
            ResourceKind::Translations,
            locale.code().to_string(),
        ));
        info!(%locale, dropped, "language switched");
        Ok(())
    }
}

impl std::fmt::Debug for PreferencesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferencesService").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::query::ttl;
    use crate::testing::{ManualClock, MemoryStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use steward_domain::{CacheKey, ListParams};

    fn service() -> (PreferencesService, Arc<MemoryStore>, Arc<ResourceCache>) {
        let store = Arc::new(MemoryStore::default());
        let cache = Arc::new(ResourceCache::new(ManualClock::new()));
        (
            PreferencesService::new(store.clone(), Arc::clone(&cache)),
            store,
            cache,
        )
    }

    fn map_key(language: &str) -> CacheKey {
        CacheKey::list(
            ResourceKind::Translations,
            ListParams::all().with_view("map").with_language(language),
        )
    }

    #[tokio::test]
    async fn defaults_when_nothing_stored() {
        let (service, _, _) = service();
        assert_eq!(service.load().await.unwrap(), Preferences::default());
    }

    #[tokio::test]
    async fn toggle_persists_the_new_theme() {
        let (service, store, _) = service();

        assert_eq!(service.toggle_theme().await.unwrap(), ThemeMode::Dark);
        assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));
        assert_eq!(service.toggle_theme().await.unwrap(), ThemeMode::Light);
    }

    #[tokio::test]
    async fn locale_switch_drops_only_that_language() {
        let (service, store, cache) = service();
        cache.set(map_key("uz"), json!({}), ttl::TRANSLATION_MAP);
        cache.set(map_key("en"), json!({}), ttl::TRANSLATION_MAP);

        service.set_locale(Locale::Uz).await.unwrap();

        assert_eq!(store.get(LANGUAGE_KEY).await.unwrap().as_deref(), Some("uz"));
        assert!(cache.get(&map_key("uz")).value().is_none());
        assert!(cache.get(&map_key("en")).is_fresh());
        assert_eq!(service.load().await.unwrap().locale, Locale::Uz);
    }
}
