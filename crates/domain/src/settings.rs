//! User preferences domain model.
//!
//! Theme and locale are the only preferences that survive a restart besides
//! the token. They are stored as plain strings under the `theme` and
//! `language` keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DomainError, DomainResult};

/// Storage key of the theme preference.
pub const THEME_KEY: &str = "theme";

/// Storage key of the locale preference.
pub const LANGUAGE_KEY: &str = "language";

/// Theme mode preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light mode theme (default).
    #[default]
    Light,
    /// Dark mode theme.
    Dark,
}

impl ThemeMode {
    /// Returns true if dark mode should be used.
    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    /// Returns the other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(DomainError::UnsupportedTheme(other.to_string())),
        }
    }
}

/// Interface language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English (default).
    #[default]
    En,
    /// Russian.
    Ru,
    /// Uzbek.
    Uz,
}

impl Locale {
    /// All supported locales.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::En, Self::Ru, Self::Uz]
    }

    /// ISO 639-1 code, as used by the translations endpoints.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
            Self::Uz => "uz",
        }
    }

    /// Name of the language in itself.
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ru => "Русский",
            Self::Uz => "O'zbekcha",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ru" => Ok(Self::Ru),
            "uz" => Ok(Self::Uz),
            other => Err(DomainError::UnsupportedLocale(other.to_string())),
        }
    }
}

/// Durable user preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Theme mode preference.
    #[serde(default)]
    pub theme: ThemeMode,
    /// Interface language.
    #[serde(default)]
    pub locale: Locale,
}

impl Preferences {
    /// Builds preferences from stored strings, falling back to defaults for
    /// missing or unrecognized values.
    #[must_use]
    pub fn from_stored(theme: Option<&str>, language: Option<&str>) -> Self {
        Self {
            theme: theme.and_then(|t| t.parse().ok()).unwrap_or_default(),
            locale: language.and_then(|l| l.parse().ok()).unwrap_or_default(),
        }
    }
}
