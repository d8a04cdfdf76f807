//! Theme selection with validated persistence.
//!
//! The persisted preference is untrusted input: anything that is not the id of
//! a known theme is logged, removed from the store and replaced by the default.

mod catalog;
mod error;
mod store;

pub use catalog::{Layout, Theme, ThemeConfig, UnknownTheme, ALL_THEMES};
pub use error::StoreError;
pub use store::{safe_get, safe_remove, safe_set, FileStore, MemoryStore, PreferenceStore};

use tracing::{info, warn};

/// Key under which the theme preference is persisted.
pub const THEME_STORAGE_KEY: &str = "app_theme_preference";

/// Current theme plus the store it is persisted to.
pub struct ThemeManager {
    store: Box<dyn PreferenceStore>,
    current: Theme,
}

impl ThemeManager {
    /// Restores the persisted theme from `store`, falling back to the default.
    ///
    /// When nothing valid was stored, the default is written back so the
    /// store always reflects the active theme.
    pub fn load(store: Box<dyn PreferenceStore>) -> Self {
        let restored = match safe_get(store.as_ref(), THEME_STORAGE_KEY) {
            Some(saved) => match saved.parse::<Theme>() {
                Ok(theme) => {
                    info!(theme = %theme, "Theme loaded from store");
                    Some(theme)
                }
                Err(_) => {
                    warn!(theme = %saved, "Invalid theme value found in store");
                    safe_remove(store.as_ref(), THEME_STORAGE_KEY);
                    None
                }
            },
            None => None,
        };

        let manager = Self {
            store,
            current: restored.unwrap_or_default(),
        };
        if restored.is_none() {
            manager.persist();
        }
        manager
    }

    /// Returns the active theme.
    pub fn current(&self) -> Theme {
        self.current
    }

    /// Returns the presentation settings of the active theme.
    pub fn config(&self) -> ThemeConfig {
        self.current.config()
    }

    /// Switches to the theme named `id` and persists it.
    ///
    /// Returns false, leaving the theme unchanged, if `id` is unknown.
    /// Selecting the active theme again is accepted without touching the store.
    pub fn set_theme(&mut self, id: &str) -> bool {
        let Ok(theme) = id.parse::<Theme>() else {
            warn!(theme = id, "Attempted to set invalid theme");
            return false;
        };

        let previous = self.current;
        if previous == theme {
            return true;
        }
        self.current = theme;
        info!(from = %previous, to = %theme, "Theme changed");
        self.persist();
        true
    }

    fn persist(&self) {
        if safe_set(self.store.as_ref(), THEME_STORAGE_KEY, self.current.id()) {
            info!(theme = %self.current, "Theme saved to store");
        }
    }

    /// CSS classes for the document root, restricted to `[A-Za-z0-9_-]`.
    pub fn css_classes(&self) -> String {
        let config = self.config();
        format!(
            "{} {}",
            css_identifier(config.class_name),
            css_identifier(config.font_family)
        )
    }
}

fn css_identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Store handle that lets the test inspect what the manager persisted.
    #[derive(Clone, Default)]
    struct SharedStore {
        inner: Arc<MemoryStore>,
        writes: Arc<AtomicUsize>,
    }

    impl SharedStore {
        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    impl PreferenceStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn empty_store_uses_default_theme() {
        let manager = ThemeManager::load(Box::new(MemoryStore::new()));
        assert_eq!(manager.current(), Theme::Default);
        assert_eq!(manager.config().layout, Layout::Vertical);
    }

    #[test]
    fn restores_saved_theme() {
        let store = SharedStore::default();
        store.set(THEME_STORAGE_KEY, "playful").unwrap();

        let manager = ThemeManager::load(Box::new(store));
        assert_eq!(manager.current(), Theme::Playful);
    }

    #[test]
    fn invalid_saved_theme_is_removed() {
        let store = SharedStore::default();
        store.set(THEME_STORAGE_KEY, "<script>").unwrap();

        let manager = ThemeManager::load(Box::new(store.clone()));
        assert_eq!(manager.current(), Theme::Default);
        assert_eq!(
            store.get(THEME_STORAGE_KEY).unwrap().as_deref(),
            Some("default")
        );
    }

    #[test]
    fn empty_store_is_given_the_default() {
        let store = SharedStore::default();
        ThemeManager::load(Box::new(store.clone()));

        assert_eq!(
            store.get(THEME_STORAGE_KEY).unwrap().as_deref(),
            Some("default")
        );
    }

    #[test]
    fn restored_theme_is_not_rewritten() {
        let store = SharedStore::default();
        store.set(THEME_STORAGE_KEY, "dark").unwrap();

        ThemeManager::load(Box::new(store.clone()));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn reselecting_the_active_theme_leaves_the_store_alone() {
        let store = SharedStore::default();
        let mut manager = ThemeManager::load(Box::new(store.clone()));
        assert!(manager.set_theme("dark"));
        let writes = store.writes();

        assert!(manager.set_theme("dark"));
        assert_eq!(manager.current(), Theme::Dark);
        assert_eq!(store.writes(), writes);
    }

    #[test]
    fn set_theme_persists_valid_choice() {
        let store = SharedStore::default();
        let mut manager = ThemeManager::load(Box::new(store.clone()));

        assert!(manager.set_theme("dark"));
        assert_eq!(manager.current(), Theme::Dark);
        assert_eq!(
            store.get(THEME_STORAGE_KEY).unwrap().as_deref(),
            Some("dark")
        );
    }

    #[test]
    fn set_theme_rejects_unknown_choice() {
        let store = SharedStore::default();
        let mut manager = ThemeManager::load(Box::new(store.clone()));

        assert!(!manager.set_theme("neon"));
        assert_eq!(manager.current(), Theme::Default);
        assert_eq!(
            store.get(THEME_STORAGE_KEY).unwrap().as_deref(),
            Some("default")
        );
    }

    #[test]
    fn css_classes_combine_class_and_font() {
        let mut manager = ThemeManager::load(Box::new(MemoryStore::new()));
        manager.set_theme("dark");
        assert_eq!(manager.css_classes(), "theme-dark font-playfair");
    }

    #[test]
    fn css_identifier_strips_unsafe_characters() {
        assert_eq!(css_identifier("theme-x\"><img src=x>"), "theme-ximgsrcx");
        assert_eq!(css_identifier("font_sans-1"), "font_sans-1");
    }
}
