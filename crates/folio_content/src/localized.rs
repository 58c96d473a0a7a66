//! Per-language values
//!
//! In JSON a localized field is either a map from language code to value or
//! a bare value, which counts as English:
//!
//! ```json
//! { "title": { "en": "Projects", "fr": "Projets" }, "name": "Ada" }
//! ```

use std::collections::BTreeMap;

use folio_theme::Language;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Code used when the requested language is missing
pub const FALLBACK_LANGUAGE: Language = Language::En;

/// A value with one variant per language code
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Localized<T> {
    values: BTreeMap<String, T>,
}

impl<T> Default for Localized<T> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<T> Localized<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A value used for every language
    pub fn single(value: T) -> Self {
        Self::new().with(FALLBACK_LANGUAGE, value)
    }

    pub fn with(mut self, language: Language, value: T) -> Self {
        self.values.insert(language.code().to_string(), value);
        self
    }

    /// Value for `language`, else English, else any value
    pub fn get(&self, language: Language) -> Option<&T> {
        self.get_with(language, |_| true)
    }

    /// Like [`Localized::get`], skipping values `usable` rejects
    pub fn get_with(&self, language: Language, usable: impl Fn(&T) -> bool) -> Option<&T> {
        self.values
            .get(language.code())
            .filter(|v| usable(v))
            .or_else(|| {
                self.values
                    .get(FALLBACK_LANGUAGE.code())
                    .filter(|v| usable(v))
            })
            .or_else(|| self.values.values().find(|v| usable(v)))
    }

    /// Whether `language` has its own value
    pub fn has(&self, language: Language) -> bool {
        self.values.contains_key(language.code())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Localized<String> {
    /// Text for `language`; empty strings fall back like missing ones
    pub fn text(&self, language: Language) -> &str {
        self.get_with(language, |s| !s.trim().is_empty())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl<T> Localized<Vec<T>> {
    /// Items for `language`; an empty list falls back like a missing one
    pub fn items(&self, language: Language) -> &[T] {
        self.get_with(language, |v| !v.is_empty())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl<T: Serialize> Serialize for Localized<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr<T> {
    ByLanguage(BTreeMap<String, T>),
    Single(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Localized<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Repr::deserialize(deserializer)? {
            Repr::ByLanguage(values) => Self { values },
            Repr::Single(value) => Self::single(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_to_english() {
        let title: Localized<String> =
            serde_json::from_str(r#"{ "en": "Projects", "fr": "Projets" }"#).unwrap();
        assert_eq!(title.text(Language::Fr), "Projets");
        assert_eq!(title.text(Language::De), "Projects");
        assert!(!title.has(Language::De));
    }

    #[test]
    fn test_bare_value_is_english() {
        let name: Localized<String> = serde_json::from_str(r#""Ada""#).unwrap();
        assert_eq!(name.text(Language::De), "Ada");
        assert_eq!(name.codes().collect::<Vec<_>>(), vec!["en"]);
    }

    #[test]
    fn test_empty_translation_falls_back() {
        let steps: Localized<Vec<String>> =
            serde_json::from_str(r#"{ "en": ["Design", "Build"], "fr": [] }"#).unwrap();
        assert_eq!(steps.items(Language::Fr), ["Design", "Build"]);
        assert_eq!(steps.get(Language::Fr).map(Vec::len), Some(0));
    }

    #[test]
    fn test_missing_everywhere() {
        let empty: Localized<String> = Localized::new();
        assert_eq!(empty.text(Language::En), "");
        assert!(empty.get(Language::En).is_none());
    }
}
