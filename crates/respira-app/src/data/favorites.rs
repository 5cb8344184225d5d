//! Favorite phrases
//!
//! An ordered list of phrase strings, most recent first, deduplicated by
//! exact text equality and capped. Persists across restarts; everything
//! else in a session is tab-lifetime state.

use crate::config::favorites::MAX_FAVORITES;
use crate::data::storage;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Favorites data file name
const FAVORITES_FILE: &str = "favorites.json";

/// Favorites file format version for migrations
const FAVORITES_VERSION: u32 = 1;

/// Favorites file structure
#[derive(Debug, Serialize, Deserialize)]
struct FavoritesFile {
    version: u32,
    phrases: Vec<String>,
}

/// Manages favorite phrases in memory
pub struct FavoritesStore {
    /// Most recent first
    phrases: Vec<String>,
    /// Whether there are unsaved changes
    dirty: bool,
}

impl FavoritesStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            phrases: Vec::new(),
            dirty: false,
        }
    }

    /// Load favorites from default storage location
    pub fn load() -> Result<Self> {
        let path = storage::data_path(FAVORITES_FILE)?;
        Self::load_from(&path)
    }

    /// Load favorites from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut store = Self::new();
        if let Some(file) = storage::load_from::<FavoritesFile>(path)? {
            store.phrases = file.phrases;
            store.phrases.truncate(MAX_FAVORITES);
        }
        store.dirty = false;
        Ok(store)
    }

    /// Save favorites to default storage location
    pub fn save(&mut self) -> Result<()> {
        let path = storage::data_path(FAVORITES_FILE)?;
        self.save_to(&path)
    }

    /// Save favorites to a specific path
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let file = FavoritesFile {
            version: FAVORITES_VERSION,
            phrases: self.phrases.clone(),
        };
        storage::save_to(path, &file)?;
        self.dirty = false;
        Ok(())
    }

    /// Check if there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Toggle membership of a phrase; returns the new membership state.
    ///
    /// Adding puts the phrase at the front; re-adding a phrase that was
    /// dropped by the cap behaves like a fresh add.
    pub fn toggle(&mut self, phrase: &str) -> bool {
        if self.contains(phrase) {
            self.remove(phrase);
            false
        } else {
            self.phrases.insert(0, phrase.to_string());
            self.phrases.truncate(MAX_FAVORITES);
            self.dirty = true;
            true
        }
    }

    /// Remove a phrase by exact text match (no-op if absent)
    pub fn remove(&mut self, phrase: &str) {
        let before = self.phrases.len();
        self.phrases.retain(|p| p != phrase);
        if self.phrases.len() != before {
            self.dirty = true;
        }
    }

    /// Check membership by exact text match
    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.iter().any(|p| p == phrase)
    }

    /// All favorites, most recent first
    pub fn list(&self) -> &[String] {
        &self.phrases
    }

    /// Number of favorites
    pub fn count(&self) -> usize {
        self.phrases.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl Default for FavoritesStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_path() -> std::path::PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        temp_dir().join(format!("respira_fav_test_{}.json", id))
    }

    #[test]
    fn toggle_on_then_off() {
        let mut store = FavoritesStore::new();

        assert!(store.toggle("Cree en ti y todo será posible."));
        assert_eq!(store.list(), ["Cree en ti y todo será posible."]);

        assert!(!store.toggle("Cree en ti y todo será posible."));
        assert!(store.list().is_empty());
    }

    #[test]
    fn paired_toggles_restore_original_state() {
        let mut store = FavoritesStore::new();
        store.toggle("Respira hondo.");

        let snapshot: Vec<String> = store.list().to_vec();
        store.toggle("Hoy es un buen día.");
        store.toggle("Hoy es un buen día.");
        assert_eq!(store.list(), snapshot.as_slice());
    }

    #[test]
    fn most_recent_first() {
        let mut store = FavoritesStore::new();
        store.toggle("primera");
        store.toggle("segunda");
        store.toggle("tercera");
        assert_eq!(store.list(), ["tercera", "segunda", "primera"]);
    }

    #[test]
    fn dedup_by_exact_text() {
        let mut store = FavoritesStore::new();
        store.toggle("igual");
        // Different text (trailing space) is a different phrase
        store.toggle("igual ");
        assert_eq!(store.count(), 2);
        // Exact match toggles off
        store.toggle("igual");
        assert_eq!(store.list(), ["igual "]);
    }

    #[test]
    fn cap_drops_oldest() {
        let mut store = FavoritesStore::new();
        for i in 0..(MAX_FAVORITES + 10) {
            store.toggle(&format!("frase {}", i));
        }
        assert_eq!(store.count(), MAX_FAVORITES);
        // Newest kept, oldest gone
        assert!(store.contains(&format!("frase {}", MAX_FAVORITES + 9)));
        assert!(!store.contains("frase 0"));
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut store = FavoritesStore::new();
        store.toggle("hay");
        store.remove("no hay");
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn dirty_flag_tracks_changes() {
        let mut store = FavoritesStore::new();
        assert!(!store.is_dirty());
        store.toggle("algo");
        assert!(store.is_dirty());
    }

    #[test]
    fn remove_absent_does_not_dirty() {
        let mut store = FavoritesStore::new();
        store.remove("nada");
        assert!(!store.is_dirty());
    }

    // --- Persistence ---

    #[test]
    fn save_and_load_preserves_order() {
        let path = temp_path();

        {
            let mut store = FavoritesStore::new();
            store.toggle("uno");
            store.toggle("dos");
            store.save_to(&path).unwrap();
        }

        {
            let store = FavoritesStore::load_from(&path).unwrap();
            assert_eq!(store.list(), ["dos", "uno"]);
            assert!(!store.is_dirty());
        }

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_nonexistent_is_empty() {
        let store = FavoritesStore::load_from(&temp_path()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn save_skips_when_not_dirty() {
        let path = temp_path();
        let mut store = FavoritesStore::new();
        store.save_to(&path).unwrap();
        assert!(!path.exists());

        store.toggle("algo");
        store.save_to(&path).unwrap();
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn toggle_after_reload_still_removes() {
        let path = temp_path();

        {
            let mut store = FavoritesStore::new();
            store.toggle("persistente");
            store.save_to(&path).unwrap();
        }

        {
            let mut store = FavoritesStore::load_from(&path).unwrap();
            assert!(!store.toggle("persistente"));
            store.save_to(&path).unwrap();
        }

        {
            let store = FavoritesStore::load_from(&path).unwrap();
            assert!(store.is_empty());
        }

        let _ = fs::remove_file(&path);
    }
}
