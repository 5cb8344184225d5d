//! Shared session types
//!
//! Pure data types used across the session subsystem.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::pattern::BreathPattern;

/// One of the four named segments of a breathing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Inhale,
    HoldIn,
    Exhale,
    HoldOut,
}

impl Phase {
    /// Phases in cycle order
    pub const ORDER: [Phase; 4] = [Phase::Inhale, Phase::HoldIn, Phase::Exhale, Phase::HoldOut];

    /// Position within the cycle (0..=3)
    pub fn index(self) -> usize {
        match self {
            Phase::Inhale => 0,
            Phase::HoldIn => 1,
            Phase::Exhale => 2,
            Phase::HoldOut => 3,
        }
    }

    /// The phase that follows this one in the fixed cyclic order
    pub fn next(self) -> Phase {
        Self::ORDER[(self.index() + 1) % 4]
    }

    /// Duration of this phase under the given pattern
    pub fn duration_in(self, pattern: &BreathPattern) -> f32 {
        match self {
            Phase::Inhale => pattern.inhale_secs,
            Phase::HoldIn => pattern.hold_in_secs,
            Phase::Exhale => pattern.exhale_secs,
            Phase::HoldOut => pattern.hold_out_secs,
        }
    }

    /// True for the phases that carry an audio cue (holds are silent)
    pub fn is_breathing(self) -> bool {
        matches!(self, Phase::Inhale | Phase::Exhale)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Inhale => write!(f, "Inhale"),
            Phase::HoldIn => write!(f, "Hold"),
            Phase::Exhale => write!(f, "Exhale"),
            Phase::HoldOut => write!(f, "Hold"),
        }
    }
}

/// Result of a `start` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session was started
    Started,
    /// A session is already running; the call changed nothing
    Busy,
}

/// Sequencer behavior toggles
#[derive(Debug, Clone, Copy, Default)]
pub struct SequencerOptions {
    /// Force-stop in-flight cue audio on pause (default: let it finish)
    pub stop_cues_on_pause: bool,
    /// Force-stop in-flight cue audio on stop (default: let it finish)
    pub stop_cues_on_stop: bool,
}

/// Snapshot of the active session — shared between the sequencer thread
/// and frontends
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub running: bool,
    pub paused: bool,
    pub phase: Phase,
    pub phase_duration_secs: f32,
    pub phase_remaining_secs: f32,
    pub elapsed_secs: f32,
    pub cycles_completed: u32,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            running: false,
            paused: false,
            phase: Phase::Inhale,
            phase_duration_secs: 0.0,
            phase_remaining_secs: 0.0,
            elapsed_secs: 0.0,
            cycles_completed: 0,
        }
    }
}

impl SessionSnapshot {
    /// Reset to the idle state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fraction of the current phase already elapsed (0.0..=1.0)
    pub fn phase_progress(&self) -> f32 {
        if self.phase_duration_secs <= 0.0 {
            return 0.0;
        }
        (1.0 - self.phase_remaining_secs / self.phase_duration_secs).clamp(0.0, 1.0)
    }
}

/// Shared handle to the session snapshot
pub type SharedSession = Arc<Mutex<SessionSnapshot>>;

/// Commands sent to the sequencer thread
#[derive(Debug)]
pub enum SequencerCommand {
    /// Begin a session with the given pattern and optional total duration
    Start {
        pattern: BreathPattern,
        total: Option<Duration>,
    },
    /// Stop the active session at the next safe point
    Stop,
    /// Freeze the countdown
    Pause,
    /// Resume a frozen countdown
    Resume,
    /// Shut down the sequencer thread
    Shutdown,
}

/// Events emitted by the sequencer
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerEvent {
    /// A phase was entered (fires exactly once per phase entry)
    PhaseStarted { phase: Phase, duration_secs: f32 },
    /// Whole-second countdown update for the current phase
    Countdown { phase: Phase, remaining_secs: u32 },
    /// The countdown was frozen
    Paused,
    /// The countdown was resumed
    Resumed,
    /// The session ended; `natural` is true when the configured total
    /// duration ran out, false when the user stopped it
    Finished { natural: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_order_is_cyclic() {
        assert_eq!(Phase::Inhale.next(), Phase::HoldIn);
        assert_eq!(Phase::HoldIn.next(), Phase::Exhale);
        assert_eq!(Phase::Exhale.next(), Phase::HoldOut);
        assert_eq!(Phase::HoldOut.next(), Phase::Inhale);
    }

    #[test]
    fn phase_default_is_inhale() {
        assert_eq!(Phase::default(), Phase::Inhale);
    }

    #[test]
    fn phase_indices_match_order() {
        for (i, phase) in Phase::ORDER.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }

    #[test]
    fn only_breathing_phases_carry_cues() {
        assert!(Phase::Inhale.is_breathing());
        assert!(Phase::Exhale.is_breathing());
        assert!(!Phase::HoldIn.is_breathing());
        assert!(!Phase::HoldOut.is_breathing());
    }

    #[test]
    fn phase_durations_from_pattern() {
        let p = BreathPattern::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Phase::Inhale.duration_in(&p), 1.0);
        assert_eq!(Phase::HoldIn.duration_in(&p), 2.0);
        assert_eq!(Phase::Exhale.duration_in(&p), 3.0);
        assert_eq!(Phase::HoldOut.duration_in(&p), 4.0);
    }

    #[test]
    fn phase_display_labels() {
        assert_eq!(Phase::Inhale.to_string(), "Inhale");
        assert_eq!(Phase::HoldIn.to_string(), "Hold");
        assert_eq!(Phase::Exhale.to_string(), "Exhale");
        assert_eq!(Phase::HoldOut.to_string(), "Hold");
    }

    #[test]
    fn snapshot_default_is_idle() {
        let s = SessionSnapshot::default();
        assert!(!s.running);
        assert!(!s.paused);
        assert_eq!(s.cycles_completed, 0);
    }

    #[test]
    fn snapshot_reset_clears_progress() {
        let mut s = SessionSnapshot {
            running: true,
            paused: true,
            phase: Phase::Exhale,
            phase_duration_secs: 4.0,
            phase_remaining_secs: 1.0,
            elapsed_secs: 30.0,
            cycles_completed: 2,
        };
        s.reset();
        assert!(!s.running);
        assert_eq!(s.elapsed_secs, 0.0);
        assert_eq!(s.phase, Phase::Inhale);
    }

    #[test]
    fn phase_progress_bounds() {
        let mut s = SessionSnapshot {
            phase_duration_secs: 4.0,
            phase_remaining_secs: 4.0,
            ..Default::default()
        };
        assert_eq!(s.phase_progress(), 0.0);
        s.phase_remaining_secs = 0.0;
        assert_eq!(s.phase_progress(), 1.0);
        s.phase_remaining_secs = 2.0;
        assert!((s.phase_progress() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn phase_progress_zero_duration_is_zero() {
        let s = SessionSnapshot::default();
        assert_eq!(s.phase_progress(), 0.0);
    }

    #[test]
    fn start_outcome_equality() {
        assert_eq!(StartOutcome::Started, StartOutcome::Started);
        assert_ne!(StartOutcome::Started, StartOutcome::Busy);
    }

    #[test]
    fn options_default_lets_audio_finish() {
        let opts = SequencerOptions::default();
        assert!(!opts.stop_cues_on_pause);
        assert!(!opts.stop_cues_on_stop);
    }
}
