//! Configuration constants for respira app services

/// Application metadata
pub mod app {
    /// Application name (used for config directory, etc.)
    pub const NAME: &str = "respira";
}

/// Network-related configuration
pub mod network {
    /// User agent for HTTP requests
    pub const USER_AGENT: &str = concat!("Respira/", env!("CARGO_PKG_VERSION"));

    /// Connection timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Read timeout in seconds
    pub const READ_TIMEOUT_SECS: u64 = 30;
}

/// Personalization configuration
pub mod personalization {
    /// Default base URL for per-user profile records
    pub const DEFAULT_BASE_URL: &str = "https://respira.app";

    /// Filename prefix of per-user JSON records (`llavero{id}.json`)
    pub const RECORD_PREFIX: &str = "llavero";

    /// Maximum accepted key-id length
    pub const MAX_KEY_ID_LEN: usize = 32;
}

/// Auth bridge configuration
pub mod auth {
    /// Default base URL of the external auth plugin
    pub const DEFAULT_PLUGIN_BASE: &str = "https://respira.app/wp-json/llavero/v1";
}

/// Favorites configuration
pub mod favorites {
    /// Most phrases kept; the oldest entry is dropped beyond this
    pub const MAX_FAVORITES: usize = 200;
}

/// Session history configuration
pub mod history {
    /// Most records kept; the oldest entry is dropped beyond this
    pub const MAX_RECORDS: usize = 500;
}

/// Offline audio asset cache configuration
pub mod assets {
    /// Cache format version. Bumping this clears the cache wholesale on
    /// next open; there is no incremental migration.
    pub const CACHE_VERSION: u32 = 1;

    /// Name of the version marker file inside the cache directory
    pub const VERSION_MARKER: &str = "cache_version";

    /// The fixed list of audio files the cache mirrors
    pub const AUDIO_FILES: &[&str] = &["respiracion.ogg", "ambiente.ogg"];
}

/// Phrase selection configuration
pub mod phrases {
    /// How many recent picks are remembered to avoid repeats
    pub const RECENT_WINDOW: usize = 8;
}
