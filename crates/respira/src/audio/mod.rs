//! Cue-audio subsystem
//!
//! Asset decoding and the playback engine for breath cues and the
//! ambient loop.

pub mod assets;
pub mod engine;
pub mod types;

pub use assets::AssetLibrary;
pub use engine::CueEngine;
pub use types::{CueEvent, CueKind, CuePlayer, NullCuePlayer, Segment};
