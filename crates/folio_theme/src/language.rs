//! Page language
//!
//! A stored choice wins; otherwise the primary subtag of the browser locale
//! picks a supported language; otherwise English.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{PreferenceError, Result};
use crate::store::{PreferenceStore, LANGUAGE_KEY};

/// A supported page language
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    De,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Fr, Language::De];

    /// ISO 639-1 code
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::De => "de",
        }
    }

    /// Language for a BCP 47 tag such as `fr-CA`; unsupported tags give English
    pub fn from_locale(locale: &str) -> Self {
        let primary = locale.split(['-', '_']).next().unwrap_or_default();
        primary.parse().unwrap_or_default()
    }

    pub fn resolve(stored: Option<&str>, locale: Option<&str>) -> Self {
        if let Some(lang) = stored.and_then(|s| s.parse().ok()) {
            return lang;
        }
        locale.map(Language::from_locale).unwrap_or_default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "fr" => Ok(Language::Fr),
            "de" => Ok(Language::De),
            _ => Err(PreferenceError::Unknown {
                key: LANGUAGE_KEY,
                value: s.to_string(),
            }),
        }
    }
}

/// Selected language with optional persistence
pub struct LanguageState {
    current: Mutex<Language>,
    store: Option<Arc<dyn PreferenceStore>>,
}

impl LanguageState {
    pub fn new(language: Language) -> Self {
        Self {
            current: Mutex::new(language),
            store: None,
        }
    }

    /// Resolve from the store and the browser locale
    pub fn load(store: Arc<dyn PreferenceStore>, locale: Option<&str>) -> Self {
        let stored = store.get(LANGUAGE_KEY).unwrap_or_else(|err| {
            tracing::warn!("LanguageState: could not read preferences: {}", err);
            None
        });
        let language = Language::resolve(stored.as_deref(), locale);
        tracing::debug!("LanguageState: resolved {}", language);
        Self {
            current: Mutex::new(language),
            store: Some(store),
        }
    }

    pub fn get(&self) -> Language {
        self.current.lock().map(|l| *l).unwrap_or_default()
    }

    /// Switch language and persist it
    pub fn set(&self, language: Language) -> Result<()> {
        if let Ok(mut current) = self.current.lock() {
            *current = language;
        }
        match &self.store {
            Some(store) => store.set(LANGUAGE_KEY, language.code()),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for LanguageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageState")
            .field("current", &self.get())
            .field("persisted", &self.store.is_some())
            .finish()
    }
}
