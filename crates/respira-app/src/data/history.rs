//! Breathing-session history
//!
//! Append-only record of past sessions, newest first, capped.

use crate::config::history::MAX_RECORDS;
use crate::data::storage;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// History data file name
const HISTORY_FILE: &str = "history.json";

/// History file format version for migrations
const HISTORY_VERSION: u32 = 1;

/// One completed or aborted session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    /// Unix timestamp (seconds) of session start
    pub started_at: i64,
    /// Pattern label, e.g. "box" or "4-7-8-1"
    pub pattern: String,
    /// How long the session actually ran
    pub duration_secs: u32,
    /// Full cycles completed
    pub cycles: u32,
    /// True when the session ran its configured total; false for a user stop
    pub completed: bool,
}

impl SessionRecord {
    /// Record starting now
    pub fn now(pattern: impl Into<String>, duration_secs: u32, cycles: u32, completed: bool) -> Self {
        Self {
            started_at: unix_now(),
            pattern: pattern.into(),
            duration_secs,
            cycles,
            completed,
        }
    }
}

/// Current unix time in seconds
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// History file structure
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    records: Vec<SessionRecord>,
}

/// Manages session history in memory, newest first
pub struct SessionLog {
    records: Vec<SessionRecord>,
    dirty: bool,
}

impl SessionLog {
    /// Create a new empty log
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            dirty: false,
        }
    }

    /// Load history from default storage location
    pub fn load() -> Result<Self> {
        let path = storage::data_path(HISTORY_FILE)?;
        Self::load_from(&path)
    }

    /// Load history from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut log = Self::new();
        if let Some(file) = storage::load_from::<HistoryFile>(path)? {
            log.records = file.records;
            log.records.truncate(MAX_RECORDS);
        }
        log.dirty = false;
        Ok(log)
    }

    /// Save history to default storage location
    pub fn save(&mut self) -> Result<()> {
        let path = storage::data_path(HISTORY_FILE)?;
        self.save_to(&path)
    }

    /// Save history to a specific path
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let file = HistoryFile {
            version: HISTORY_VERSION,
            records: self.records.clone(),
        };
        storage::save_to(path, &file)?;
        self.dirty = false;
        Ok(())
    }

    /// Append a record (becomes the newest entry)
    pub fn record(&mut self, record: SessionRecord) {
        self.records.insert(0, record);
        self.records.truncate(MAX_RECORDS);
        self.dirty = true;
    }

    /// The most recent records, newest first
    pub fn recent(&self, limit: usize) -> &[SessionRecord] {
        &self.records[..limit.min(self.records.len())]
    }

    /// All records, newest first
    pub fn all(&self) -> &[SessionRecord] {
        &self.records
    }

    /// Number of records
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Total seconds breathed across all recorded sessions
    pub fn total_secs(&self) -> u64 {
        self.records.iter().map(|r| r.duration_secs as u64).sum()
    }

    /// Check if there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}
