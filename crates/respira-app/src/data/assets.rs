//! Offline audio asset cache
//!
//! Mirrors the fixed list of cue/ambient audio files locally so sessions
//! work offline. The cache is guarded by a version marker: on a version
//! bump the whole directory is cleared and rebuilt — there is no
//! incremental migration.

use crate::config::app::NAME;
use crate::config::assets::{AUDIO_FILES, CACHE_VERSION, VERSION_MARKER};
use crate::error::{AppError, Result};
use crate::network::HttpClient;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the application cache directory path
pub fn cache_dir() -> Result<PathBuf> {
    dirs::cache_dir().map(|p| p.join(NAME)).ok_or_else(|| {
        AppError::Config(
            "Could not determine cache directory. HOME environment variable may not be set."
                .to_string(),
        )
    })
}

/// Versioned cache of the fixed audio asset list
pub struct AssetCache {
    dir: PathBuf,
}

impl AssetCache {
    /// Open the cache at the default location, clearing it if it was
    /// written by a different version
    pub fn open() -> Result<Self> {
        Self::open_at(cache_dir()?)
    }

    /// Open the cache at a custom directory (for testing)
    pub fn open_at(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Config(format!("Failed to create cache directory {:?}: {}", dir, e))
        })?;
        let cache = Self { dir };
        cache.ensure_version()?;
        Ok(cache)
    }

    /// The cache directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a cached asset, if present
    pub fn get(&self, name: &str) -> Option<PathBuf> {
        let path = self.dir.join(name);
        path.is_file().then_some(path)
    }

    /// Store asset bytes under the given name
    pub fn put(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(name);
        fs::write(&path, data).map_err(|e| {
            AppError::Config(format!("Failed to write cached asset {:?}: {}", path, e))
        })?;
        Ok(path)
    }

    /// Names from the fixed asset list that are present
    pub fn cached_names(&self) -> Vec<&'static str> {
        AUDIO_FILES
            .iter()
            .copied()
            .filter(|name| self.get(name).is_some())
            .collect()
    }

    /// Download any missing asset from the fixed list.
    ///
    /// Best-effort: each failure is logged and skipped. Returns the
    /// number of assets fetched.
    pub fn sync(&self, client: &HttpClient, base_url: &str) -> usize {
        let mut fetched = 0;
        for name in AUDIO_FILES {
            if self.get(name).is_some() {
                continue;
            }
            let url = format!("{}/audio/{}", base_url.trim_end_matches('/'), name);
            match client.get_bytes(&url) {
                Ok(bytes) => match self.put(name, &bytes) {
                    Ok(_) => fetched += 1,
                    Err(e) => log::warn!("could not store asset {}: {}", name, e),
                },
                Err(e) => log::warn!("could not fetch asset {}: {}", url, e),
            }
        }
        fetched
    }

    /// Verify the version marker, clearing the cache wholesale on mismatch
    fn ensure_version(&self) -> Result<()> {
        let marker = self.dir.join(VERSION_MARKER);
        let stored: Option<u32> = fs::read_to_string(&marker)
            .ok()
            .and_then(|s| s.trim().parse().ok());

        if stored != Some(CACHE_VERSION) {
            self.clear()?;
            fs::write(&marker, CACHE_VERSION.to_string()).map_err(|e| {
                AppError::Config(format!("Failed to write cache marker {:?}: {}", marker, e))
            })?;
        }
        Ok(())
    }

    /// Remove every file in the cache directory
    fn clear(&self) -> Result<()> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| AppError::Config(format!("Failed to read cache directory: {}", e)))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                let _ = fs::remove_file(&path);
            }
        }
        Ok(())
    }
}
