//! Folio Theme
//!
//! User-facing presentation preferences: the light/dark theme (with a
//! `System` choice that follows the host) and the page language. Both can
//! persist through a [`PreferenceStore`].
//!
//! ```rust
//! use std::sync::Arc;
//! use folio_theme::{Language, LanguageState, MemoryStore, ResolvedTheme, ThemeState};
//!
//! let store = Arc::new(MemoryStore::new());
//! let theme = ThemeState::load(store.clone(), ResolvedTheme::Light);
//! assert_eq!(theme.resolved(), ResolvedTheme::Light);
//!
//! let language = LanguageState::load(store, Some("fr-CA"));
//! assert_eq!(language.get(), Language::Fr);
//! ```

pub mod error;
pub mod language;
pub mod store;
pub mod theme;

pub use error::{PreferenceError, Result};
pub use language::{Language, LanguageState};
pub use store::{MemoryStore, PreferenceStore, TomlFileStore, LANGUAGE_KEY, THEME_KEY};
pub use theme::{ResolvedTheme, ThemeListenerId, ThemePreference, ThemeState};
