//! Respira — Guided Breathing Engine
//!
//! Breathing patterns, the four-phase session sequencer, and cue-audio
//! playback.
//!
//! ## Quick start
//!
//! ```no_run
//! use respira::session::{BreathPattern, BreathSequencer};
//!
//! let sequencer = BreathSequencer::spawn(None, Default::default());
//! sequencer.start(BreathPattern::default(), None);
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod session;
