//! Personalization profiles
//!
//! Fetches the small per-user JSON record addressed by a key id and maps
//! it onto the generic experience when anything goes wrong. Failures are
//! never surfaced to the user — an invalid id, a missing record, or a
//! network error all degrade to the non-personalized defaults.

use crate::config::personalization::{DEFAULT_BASE_URL, MAX_KEY_ID_LEN, RECORD_PREFIX};
use crate::error::Result;
use crate::network::HttpClient;
use serde::{Deserialize, Serialize};

/// Per-user personalization record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Display name, used to address the visitor
    #[serde(default)]
    pub nombre: String,

    /// Personal message shown on the greeting panel
    #[serde(default)]
    pub mensaje: String,

    /// Last recorded emotional state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,

    /// Preferred phrase category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,

    /// Consecutive days of practice
    #[serde(default)]
    pub racha: u32,
}

/// Check a key id against the accepted shape: 1–32 chars of
/// `[A-Za-z0-9_-]`
pub fn valid_key_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_KEY_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Fetches per-user personalization records
pub struct ProfileService {
    client: HttpClient,
    base_url: String,
}

impl ProfileService {
    /// Create a service against the default base URL
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a service with a custom base URL (settings override, tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.into(),
        })
    }

    /// URL of the record for a key id
    fn record_url(&self, id: &str) -> String {
        format!(
            "{}/users/{}{}.json",
            self.base_url.trim_end_matches('/'),
            RECORD_PREFIX,
            id
        )
    }

    /// Fetch the record for a key id.
    ///
    /// Errors on an invalid id or any transport/decode failure; most
    /// callers want [`fetch_or_default`](Self::fetch_or_default) instead.
    pub fn fetch(&self, id: &str) -> Result<UserProfile> {
        if !valid_key_id(id) {
            return Err(crate::error::AppError::NotFound(format!(
                "invalid key id '{}'",
                id
            )));
        }
        self.client.get_json(&self.record_url(id))
    }

    /// The soft path: fetch the record, falling back to the generic
    /// experience on any failure. Only a log line records what happened.
    pub fn fetch_or_default(&self, id: &str) -> Option<UserProfile> {
        match self.fetch(id) {
            Ok(profile) => Some(profile),
            Err(e) => {
                log::warn!("no personalization for '{}': {}", id, e);
                None
            }
        }
    }
}
