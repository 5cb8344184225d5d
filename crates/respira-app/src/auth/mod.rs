//! NFC auth bridge
//!
//! Exchanges a device-held secret for a personalization payload against
//! the external plugin. Requests carry `token_firma`, the lowercase-hex
//! HMAC-SHA256 of the key id under the secret. Callers only care about
//! the granted / blocked / failed trichotomy; everything else about the
//! service is opaque.

use crate::config::auth::DEFAULT_PLUGIN_BASE;
use crate::data::storage;
use crate::error::Result;
use crate::network::HttpClient;
use crate::profile::UserProfile;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Cached auth payload file name
const CACHED_AUTH_FILE: &str = "auth_cache.json";

/// Sign a key id with the device secret: lowercase-hex HMAC-SHA256
pub fn sign_key_id(key_id: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(key_id.as_bytes());
    mac.finalize()
        .into_bytes()
        .iter()
        .fold(String::with_capacity(64), |mut s, b| {
            use std::fmt::Write;
            let _ = write!(s, "{:02x}", b);
            s
        })
}

/// Outcome of an authentication attempt that got an answer
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Access granted, personalization payload attached
    Granted(UserProfile),
    /// The service denied access; `reason` is user-presentable
    Blocked { reason: String },
}

/// Request body for both plugin endpoints
#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    key_id: &'a str,
    token_firma: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<serde_json::Value>,
}

/// Plugin response shape
#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    blocked: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    user: Option<UserProfile>,
}

/// Client for the external auth plugin
pub struct AuthBridge {
    client: HttpClient,
    base_url: String,
}

impl AuthBridge {
    /// Create a bridge against the default plugin base
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_PLUGIN_BASE)
    }

    /// Create a bridge with a custom plugin base (settings override, tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Authenticate a key against the plugin.
    ///
    /// `Err` means no answer (transport/decode); callers degrade to the
    /// cached payload or the generic experience. A granted payload is
    /// cached for offline reads.
    pub fn authenticate(&self, key_id: &str, secret: &str) -> Result<AuthOutcome> {
        let request = AuthRequest {
            key_id,
            token_firma: sign_key_id(key_id, secret),
            session: None,
        };
        let response: AuthResponse = self.client.post_json(&self.endpoint("auth"), &request)?;
        let outcome = Self::map_response(response);
        if let AuthOutcome::Granted(ref profile) = outcome {
            if let Err(e) = cache_payload(profile) {
                log::warn!("could not cache auth payload: {}", e);
            }
        }
        Ok(outcome)
    }

    /// Push a session summary to the plugin, best-effort.
    ///
    /// Failures are logged only — nothing about a finished breathing
    /// session depends on the plugin hearing about it.
    pub fn push_update(&self, key_id: &str, secret: &str, session: serde_json::Value) {
        let request = AuthRequest {
            key_id,
            token_firma: sign_key_id(key_id, secret),
            session: Some(session),
        };
        let result: Result<AuthResponse> =
            self.client.post_json(&self.endpoint("update"), &request);
        if let Err(e) = result {
            log::warn!("session update not delivered: {}", e);
        }
    }

    fn map_response(response: AuthResponse) -> AuthOutcome {
        if response.ok {
            AuthOutcome::Granted(response.user.unwrap_or_default())
        } else {
            let reason = response.reason.unwrap_or_else(|| {
                if response.blocked {
                    "Acceso restringido".to_string()
                } else {
                    "Solicitud rechazada".to_string()
                }
            });
            AuthOutcome::Blocked { reason }
        }
    }
}

/// Persist the last granted payload for offline reads
fn cache_payload(profile: &UserProfile) -> Result<()> {
    storage::save(CACHED_AUTH_FILE, profile)
}

/// Last granted payload, if any was ever cached
pub fn cached_payload() -> Option<UserProfile> {
    storage::load(CACHED_AUTH_FILE).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Signing ---

    #[test]
    fn signature_is_lowercase_hex_of_expected_length() {
        let tag = sign_key_id("023", "secreto");
        assert_eq!(tag.len(), 64);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn signature_is_deterministic() {
        assert_eq!(sign_key_id("023", "secreto"), sign_key_id("023", "secreto"));
    }

    #[test]
    fn signature_depends_on_key_and_secret() {
        assert_ne!(sign_key_id("023", "secreto"), sign_key_id("024", "secreto"));
        assert_ne!(sign_key_id("023", "secreto"), sign_key_id("023", "otro"));
    }

    #[test]
    fn known_vector() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        assert_eq!(
            sign_key_id("The quick brown fox jumps over the lazy dog", "key"),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    // --- Response mapping ---

    #[test]
    fn ok_response_is_granted() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"ok": true, "user": {"nombre": "Lucía", "racha": 3}}"#,
        )
        .unwrap();
        match AuthBridge::map_response(response) {
            AuthOutcome::Granted(profile) => {
                assert_eq!(profile.nombre, "Lucía");
                assert_eq!(profile.racha, 3);
            }
            other => panic!("Expected Granted, got {:?}", other),
        }
    }

    #[test]
    fn ok_without_user_grants_empty_profile() {
        let response: AuthResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(matches!(
            AuthBridge::map_response(response),
            AuthOutcome::Granted(p) if p == UserProfile::default()
        ));
    }

    #[test]
    fn blocked_response_carries_reason() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"ok": false, "blocked": true, "reason": "Llave desactivada"}"#,
        )
        .unwrap();
        match AuthBridge::map_response(response) {
            AuthOutcome::Blocked { reason } => assert_eq!(reason, "Llave desactivada"),
            other => panic!("Expected Blocked, got {:?}", other),
        }
    }

    #[test]
    fn denial_without_reason_gets_default_text() {
        let response: AuthResponse = serde_json::from_str(r#"{"ok": false}"#).unwrap();
        match AuthBridge::map_response(response) {
            AuthOutcome::Blocked { reason } => assert!(!reason.is_empty()),
            other => panic!("Expected Blocked, got {:?}", other),
        }
    }

    // --- Transport failures ---

    #[test]
    fn unreachable_plugin_is_err_not_blocked() {
        let bridge = AuthBridge::with_base_url("http://invalid.invalid.invalid").unwrap();
        assert!(bridge.authenticate("023", "secreto").is_err());
    }

    #[test]
    fn push_update_swallows_transport_failure() {
        let bridge = AuthBridge::with_base_url("http://invalid.invalid.invalid").unwrap();
        bridge.push_update("023", "secreto", serde_json::json!({"duration_secs": 60}));
    }

    #[test]
    fn endpoint_joins_cleanly() {
        let bridge = AuthBridge::with_base_url("https://example.org/v1/").unwrap();
        assert_eq!(bridge.endpoint("auth"), "https://example.org/v1/auth");
    }
}
