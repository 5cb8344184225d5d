//! Breathing-session subsystem
//!
//! Patterns, the four-phase session state machine, and its command/event
//! surface.

pub mod pattern;
pub mod sequencer;
pub mod types;

pub use pattern::BreathPattern;
pub use sequencer::BreathSequencer;
pub use types::{
    Phase, SequencerEvent, SequencerOptions, SessionSnapshot, SharedSession, StartOutcome,
};
