//! Light/dark theme state
//!
//! The user picks a [`ThemePreference`]; what the page renders is the
//! [`ResolvedTheme`]. `System` follows the host's reported color scheme and
//! keeps following it while selected.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PreferenceError, Result};
use crate::store::{PreferenceStore, THEME_KEY};

/// What the user asked for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    /// Next preference for a single toggle button: dark, light, system
    pub fn cycle(self) -> Self {
        match self {
            ThemePreference::Dark => ThemePreference::Light,
            ThemePreference::Light => ThemePreference::System,
            ThemePreference::System => ThemePreference::Dark,
        }
    }

    pub fn resolve(self, system: ResolvedTheme) -> ResolvedTheme {
        match self {
            ThemePreference::Light => ResolvedTheme::Light,
            ThemePreference::Dark => ResolvedTheme::Dark,
            ThemePreference::System => system,
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "system" => Ok(ThemePreference::System),
            _ => Err(PreferenceError::Unknown {
                key: THEME_KEY,
                value: s.to_string(),
            }),
        }
    }
}

/// The theme actually applied
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    /// Also what an unknown system scheme resolves to
    #[default]
    Dark,
}

impl ResolvedTheme {
    /// Root class name the page switches on
    pub fn class_name(self) -> &'static str {
        match self {
            ResolvedTheme::Light => "light",
            ResolvedTheme::Dark => "dark",
        }
    }

    pub fn is_dark(self) -> bool {
        self == ResolvedTheme::Dark
    }
}

/// Handle to a theme listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThemeListenerId(u64);

type SharedListener = Arc<Mutex<dyn FnMut(ResolvedTheme) + Send>>;

#[derive(Clone, Copy, Debug)]
struct ThemeInner {
    preference: ThemePreference,
    system: ResolvedTheme,
}

impl ThemeInner {
    fn resolved(&self) -> ResolvedTheme {
        self.preference.resolve(self.system)
    }
}

/// Current theme with change notification and optional persistence
pub struct ThemeState {
    inner: Mutex<ThemeInner>,
    listeners: Mutex<IndexMap<ThemeListenerId, SharedListener>>,
    next_id: AtomicU64,
    store: Option<Arc<dyn PreferenceStore>>,
}

impl ThemeState {
    pub fn new(preference: ThemePreference, system: ResolvedTheme) -> Self {
        Self {
            inner: Mutex::new(ThemeInner { preference, system }),
            listeners: Mutex::new(IndexMap::new()),
            next_id: AtomicU64::new(1),
            store: None,
        }
    }

    /// Restore the stored preference, falling back to `System`
    ///
    /// An unreadable store or an unknown stored value is logged and ignored.
    pub fn load(store: Arc<dyn PreferenceStore>, system: ResolvedTheme) -> Self {
        let preference = match store.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!("ThemeState: ignoring stored theme: {}", err);
                ThemePreference::System
            }),
            Ok(None) => ThemePreference::System,
            Err(err) => {
                tracing::warn!("ThemeState: could not read preferences: {}", err);
                ThemePreference::System
            }
        };

        let mut state = Self::new(preference, system);
        state.store = Some(store);
        state
    }

    pub fn preference(&self) -> ThemePreference {
        self.snapshot().preference
    }

    pub fn resolved(&self) -> ResolvedTheme {
        self.snapshot().resolved()
    }

    pub fn system_scheme(&self) -> ResolvedTheme {
        self.snapshot().system
    }

    /// Select a preference and persist it
    ///
    /// The new preference applies even when persisting fails.
    pub fn set_preference(&self, preference: ThemePreference) -> Result<()> {
        self.update(|inner| inner.preference = preference);
        match &self.store {
            Some(store) => store.set(THEME_KEY, preference.as_str()),
            None => Ok(()),
        }
    }

    /// Advance to the next preference and return it
    pub fn cycle(&self) -> Result<ThemePreference> {
        let next = self.preference().cycle();
        self.set_preference(next)?;
        Ok(next)
    }

    /// The host's color scheme changed
    pub fn set_system_scheme(&self, system: ResolvedTheme) {
        self.update(|inner| inner.system = system);
    }

    /// Call `listener` whenever the resolved theme changes
    pub fn on_change<F>(&self, listener: F) -> ThemeListenerId
    where
        F: FnMut(ResolvedTheme) + Send + 'static,
    {
        let id = ThemeListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, Arc::new(Mutex::new(listener)));
        }
        id
    }

    pub fn off_change(&self, id: ThemeListenerId) -> bool {
        self.listeners
            .lock()
            .map(|mut listeners| listeners.shift_remove(&id).is_some())
            .unwrap_or(false)
    }

    fn snapshot(&self) -> ThemeInner {
        self.inner.lock().map(|inner| *inner).unwrap_or(ThemeInner {
            preference: ThemePreference::System,
            system: ResolvedTheme::Dark,
        })
    }

    fn update(&self, f: impl FnOnce(&mut ThemeInner)) {
        let (before, after) = {
            let Ok(mut inner) = self.inner.lock() else {
                return;
            };
            let before = inner.resolved();
            f(&mut inner);
            (before, inner.resolved())
        };
        if before != after {
            tracing::debug!("ThemeState: {:?} -> {:?}", before, after);
            self.notify(after);
        }
    }

    fn notify(&self, theme: ResolvedTheme) {
        let listeners: Vec<SharedListener> = match self.listeners.lock() {
            Ok(listeners) => listeners.values().cloned().collect(),
            Err(_) => return,
        };
        for listener in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| {
                if let Ok(mut f) = listener.lock() {
                    f(theme);
                }
            }));
            if result.is_err() {
                tracing::error!("ThemeState: listener panicked");
            }
        }
    }
}

impl fmt::Debug for ThemeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.snapshot();
        f.debug_struct("ThemeState")
            .field("preference", &inner.preference)
            .field("resolved", &inner.resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn recorder(state: &ThemeState) -> Arc<Mutex<Vec<ResolvedTheme>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        state.on_change(move |t| sink.lock().unwrap().push(t));
        seen
    }

    #[test]
    fn test_cycle_order() {
        let mut p = ThemePreference::Dark;
        let mut order = Vec::new();
        for _ in 0..3 {
            p = p.cycle();
            order.push(p);
        }
        assert_eq!(
            order,
            vec![
                ThemePreference::Light,
                ThemePreference::System,
                ThemePreference::Dark
            ]
        );
    }

    #[test]
    fn test_system_follows_host_scheme() {
        let state = ThemeState::new(ThemePreference::System, ResolvedTheme::Dark);
        let seen = recorder(&state);

        state.set_system_scheme(ResolvedTheme::Light);
        assert_eq!(state.resolved(), ResolvedTheme::Light);

        state.set_preference(ThemePreference::Light).unwrap();
        // Host changes no longer matter
        state.set_system_scheme(ResolvedTheme::Dark);
        assert_eq!(state.resolved(), ResolvedTheme::Light);

        assert_eq!(*seen.lock().unwrap(), vec![ResolvedTheme::Light]);
    }

    #[test]
    fn test_listener_only_on_resolved_change() {
        let state = ThemeState::new(ThemePreference::Dark, ResolvedTheme::Dark);
        let seen = recorder(&state);
        // dark -> system(dark): same resolved theme
        state.set_preference(ThemePreference::System).unwrap();
        assert!(seen.lock().unwrap().is_empty());
        state.set_preference(ThemePreference::Light).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![ResolvedTheme::Light]);
    }

    #[test]
    fn test_load_and_persist() {
        let store = Arc::new(MemoryStore::new().with_value(THEME_KEY, "light"));
        let state = ThemeState::load(store.clone(), ResolvedTheme::Dark);
        assert_eq!(state.preference(), ThemePreference::Light);

        assert_eq!(state.cycle().unwrap(), ThemePreference::System);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("system"));
    }

    #[test]
    fn test_load_ignores_unknown_value() {
        let store = Arc::new(MemoryStore::new().with_value(THEME_KEY, "sepia"));
        let state = ThemeState::load(store, ResolvedTheme::Light);
        assert_eq!(state.preference(), ThemePreference::System);
        assert_eq!(state.resolved(), ResolvedTheme::Light);
    }

    #[test]
    fn test_removed_listener_not_called() {
        let state = ThemeState::new(ThemePreference::Dark, ResolvedTheme::Dark);
        let hits = Arc::new(AtomicU64::new(0));
        let id = {
            let hits = Arc::clone(&hits);
            state.on_change(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        assert!(state.off_change(id));
        state.set_preference(ThemePreference::Light).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
