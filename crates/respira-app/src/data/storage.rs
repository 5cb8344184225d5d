//! Storage layer for JSON persistence
//!
//! Provides consistent file I/O for all data types.

use crate::config::app::NAME;
use crate::error::{AppError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Get the application config directory path
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir().map(|p| p.join(NAME)).ok_or_else(|| {
        AppError::Config(
            "Could not determine config directory. HOME environment variable may not be set."
                .to_string(),
        )
    })
}

/// Get path to a specific data file in the default config directory
pub fn data_path(filename: &str) -> Result<PathBuf> {
    Ok(config_dir()?.join(filename))
}

/// Create a directory if it doesn't exist, with proper error handling
fn create_dir_if_needed(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        let msg = match e.kind() {
            ErrorKind::PermissionDenied => {
                format!("Permission denied: cannot create directory {:?}", path)
            }
            _ => format!("Failed to create directory {:?}: {}", path, e),
        };
        AppError::Config(msg)
    })
}

/// Load data from a JSON file at a specific path
///
/// Returns `None` if the file doesn't exist or is empty.
/// Returns an error if the file exists but can't be read or parsed.
pub fn load_from<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::Config(format!(
                "Failed to read {:?}: {}",
                path, e
            )))
        }
    };

    // Empty file is treated as non-existent
    if content.trim().is_empty() {
        return Ok(None);
    }

    let data = serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse {:?}: {}", path, e)))?;

    Ok(Some(data))
}

/// Save data to a JSON file at a specific path
///
/// Creates parent directories if they don't exist.
pub fn save_to<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_if_needed(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(data)
        .map_err(|e| AppError::Config(format!("Failed to serialize data: {}", e)))?;

    fs::write(path, &content)
        .map_err(|e| AppError::Config(format!("Failed to write to {:?}: {}", path, e)))
}

/// Delete a file at a specific path (missing file is fine)
pub fn delete_at(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::Config(format!(
            "Failed to delete {:?}: {}",
            path, e
        ))),
    }
}

// =============================================================================
// Convenience functions (use default config directory)
// =============================================================================

/// Load data from a JSON file in the config directory
pub fn load<T: DeserializeOwned>(filename: &str) -> Result<Option<T>> {
    load_from(&data_path(filename)?)
}

/// Save data to a JSON file in the config directory
///
/// Creates the config directory if it doesn't exist.
pub fn save<T: Serialize>(filename: &str, data: &T) -> Result<()> {
    save_to(&data_path(filename)?, data)
}

/// Delete a data file from the config directory
pub fn delete(filename: &str) -> Result<()> {
    delete_at(&data_path(filename)?)
}

/// Check if a data file exists in the config directory
pub fn exists(filename: &str) -> Result<bool> {
    Ok(data_path(filename)?.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::env::temp_dir;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_path(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        temp_dir().join(format!("respira_storage_{}_{}.json", id, name))
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn save_and_load_roundtrip() {
        let path = temp_path("roundtrip");
        let data = TestData {
            name: "respira".to_string(),
            value: 42,
        };

        save_to(&path, &data).unwrap();
        assert!(path.exists());

        let loaded: Option<TestData> = load_from(&path).unwrap();
        assert_eq!(loaded, Some(data));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_nonexistent_is_none() {
        let path = temp_path("nonexistent");
        let loaded: Option<TestData> = load_from(&path).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn load_empty_file_is_none() {
        let path = temp_path("empty");
        fs::write(&path, "").unwrap();
        let loaded: Option<TestData> = load_from(&path).unwrap();
        assert_eq!(loaded, None);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_invalid_json_errors() {
        let path = temp_path("invalid");
        fs::write(&path, "not valid json").unwrap();
        let result: Result<Option<TestData>> = load_from(&path);
        assert!(result.is_err());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn error_message_contains_path() {
        let path = temp_path("pathmsg");
        fs::write(&path, "{broken").unwrap();
        let result: Result<Option<TestData>> = load_from(&path);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("respira_storage"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn delete_is_idempotent() {
        let path = temp_path("delete");
        fs::write(&path, "x").unwrap();
        delete_at(&path).unwrap();
        assert!(!path.exists());
        // Already gone, still fine
        delete_at(&path).unwrap();
    }

    #[test]
    fn save_creates_parent_dirs() {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = temp_dir()
            .join(format!("respira_storage_nested_{}", id))
            .join("sub")
            .join("data.json");
        let data = TestData {
            name: "nested".to_string(),
            value: 7,
        };

        save_to(&path, &data).unwrap();
        assert!(path.exists());

        let _ = fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }
}
