//! Shared cue-audio types
//!
//! Pure data types plus the `CuePlayer` seam the sequencer calls into.

use std::fmt;
use std::path::PathBuf;

/// Which asset a command refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueKind {
    /// The breath cue file (inhale/exhale segments live inside it)
    Breath,
    /// The ambient background loop
    Ambient,
}

impl fmt::Display for CueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CueKind::Breath => write!(f, "breath"),
            CueKind::Ambient => write!(f, "ambient"),
        }
    }
}

/// A slice of an audio asset by offset and duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub offset_secs: f32,
    pub duration_secs: f32,
}

impl Segment {
    pub fn new(offset_secs: f32, duration_secs: f32) -> Self {
        Self {
            offset_secs,
            duration_secs,
        }
    }
}

/// Playback capability the sequencer depends on.
///
/// Every method is fire-and-forget: implementations swallow missing or
/// undecodable assets and never surface an error to the caller. The
/// timer/visual contract of a session must not depend on any of these
/// succeeding.
pub trait CuePlayer: Send + Sync {
    /// Play a slice of an asset at the given gain
    fn play_segment(&self, kind: CueKind, segment: Segment, gain: f32);

    /// Start the ambient loop (no-op if already looping)
    fn start_ambient(&self);

    /// Stop the ambient loop
    fn stop_ambient(&self);

    /// Cut any in-flight cue segment short
    fn stop_cues(&self);
}

/// A `CuePlayer` that does nothing — silent mode and tests
#[derive(Debug, Default)]
pub struct NullCuePlayer;

impl CuePlayer for NullCuePlayer {
    fn play_segment(&self, _kind: CueKind, _segment: Segment, _gain: f32) {}
    fn start_ambient(&self) {}
    fn stop_ambient(&self) {}
    fn stop_cues(&self) {}
}

/// Where the engine finds its audio files
#[derive(Debug, Clone, Default)]
pub struct AssetPaths {
    pub breath: Option<PathBuf>,
    pub ambient: Option<PathBuf>,
}

impl AssetPaths {
    /// Path for a given kind
    pub fn for_kind(&self, kind: CueKind) -> Option<&PathBuf> {
        match kind {
            CueKind::Breath => self.breath.as_ref(),
            CueKind::Ambient => self.ambient.as_ref(),
        }
    }
}

/// Commands sent to the cue engine
#[derive(Debug)]
pub enum CueCommand {
    /// Decode all configured assets ahead of first use
    Preload,
    /// Play a slice of an asset
    PlaySegment {
        kind: CueKind,
        segment: Segment,
        gain: f32,
    },
    /// Start the ambient loop
    StartAmbient,
    /// Stop the ambient loop
    StopAmbient,
    /// Cut any in-flight cue segment short
    StopCues,
    /// Master volume (clamped to 0.0..=2.0)
    SetVolume(f32),
    /// Shut down the engine thread
    Shutdown,
}

/// Events emitted by the cue engine
#[derive(Debug, Clone, PartialEq)]
pub enum CueEvent {
    /// Preload finished; count of assets decoded successfully
    Preloaded { decoded: usize },
    /// A cue could not be played; the phase continues silently
    CueFailed(String),
    /// The ambient loop started
    AmbientStarted,
    /// The ambient loop stopped
    AmbientStopped,
}
