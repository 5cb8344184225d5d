//! Configuration constants for the respira engine

/// Pattern-related configuration
pub mod pattern {
    /// Shortest playable non-zero phase in seconds.
    /// Shorter phases are raised to this on playback.
    pub const MIN_PHASE_SECS: f32 = 0.1;

    /// Longest playable phase in seconds
    pub const MAX_PHASE_SECS: f32 = 120.0;
}

/// Session/sequencer configuration
pub mod session {
    /// Sequencer thread tick interval in milliseconds.
    /// Phase boundaries are detected with this granularity.
    pub const TICK_INTERVAL_MS: u64 = 25;

    /// Command channel bound
    pub const COMMAND_QUEUE: usize = 16;

    /// Event channel bound
    pub const EVENT_QUEUE: usize = 64;
}

/// Cue-audio configuration
pub mod audio {
    /// Default gain for breath cue segments
    pub const CUE_GAIN: f32 = 1.0;

    /// Default gain for the ambient loop (kept under the cues)
    pub const AMBIENT_GAIN: f32 = 0.35;

    /// Offset of the inhale segment within the breath cue asset (seconds)
    pub const INHALE_OFFSET_SECS: f32 = 0.0;

    /// Offset of the exhale segment within the breath cue asset (seconds)
    pub const EXHALE_OFFSET_SECS: f32 = 4.0;

    /// Command channel bound for the cue engine
    pub const COMMAND_QUEUE: usize = 16;

    /// Event channel bound for the cue engine
    pub const EVENT_QUEUE: usize = 64;
}
