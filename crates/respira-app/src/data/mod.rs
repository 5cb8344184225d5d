//! Data persistence layer
//!
//! JSON storage, favorites, session history, settings, and the offline
//! audio asset cache.

pub mod assets;
pub mod favorites;
pub mod history;
pub mod settings;
pub mod storage;

pub use assets::AssetCache;
pub use favorites::FavoritesStore;
pub use history::{SessionLog, SessionRecord};
pub use settings::Settings;
