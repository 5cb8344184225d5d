//! Breathing patterns
//!
//! A pattern is the four phase durations defining one breathing cycle.
//! Named presets are constant lookups; arbitrary patterns are validated
//! before use and clamped to playable bounds on playback.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::pattern::{MAX_PHASE_SECS, MIN_PHASE_SECS};
use crate::error::{BreathError, Result};

/// Named preset patterns: (name, inhale, hold-in, exhale, hold-out)
const PRESETS: &[(&str, f32, f32, f32, f32)] = &[
    ("box", 4.0, 4.0, 4.0, 4.0),
    ("478", 4.0, 7.0, 8.0, 1.0),
    ("coherent", 5.0, 0.0, 5.0, 0.0),
    ("relax", 4.0, 2.0, 6.0, 2.0),
];

/// One breathing cycle variant: four phase durations in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreathPattern {
    /// Inhale duration
    pub inhale_secs: f32,
    /// Hold after inhaling
    pub hold_in_secs: f32,
    /// Exhale duration
    pub exhale_secs: f32,
    /// Hold after exhaling
    pub hold_out_secs: f32,
}

impl Default for BreathPattern {
    /// The "box" preset
    fn default() -> Self {
        Self::new(4.0, 4.0, 4.0, 4.0)
    }
}

impl BreathPattern {
    /// Create a pattern from raw durations (unvalidated)
    pub fn new(inhale_secs: f32, hold_in_secs: f32, exhale_secs: f32, hold_out_secs: f32) -> Self {
        Self {
            inhale_secs,
            hold_in_secs,
            exhale_secs,
            hold_out_secs,
        }
    }

    /// Look up a named preset, case-insensitively
    pub fn preset(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        PRESETS
            .iter()
            .find(|(n, ..)| *n == name)
            .map(|&(_, i, hi, e, ho)| Self::new(i, hi, e, ho))
    }

    /// Names of all built-in presets
    pub fn preset_names() -> Vec<&'static str> {
        PRESETS.iter().map(|(n, ..)| *n).collect()
    }

    /// Duration of one full cycle in seconds
    pub fn cycle_secs(&self) -> f32 {
        self.inhale_secs + self.hold_in_secs + self.exhale_secs + self.hold_out_secs
    }

    /// Check the pattern is playable.
    ///
    /// Inhale and exhale must be positive finite; holds may be zero but
    /// not negative or non-finite.
    pub fn validate(&self) -> Result<()> {
        let breathing = [("inhale", self.inhale_secs), ("exhale", self.exhale_secs)];
        for (name, secs) in breathing {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(BreathError::Pattern(format!(
                    "{} duration must be a positive number, got {}",
                    name, secs
                )));
            }
        }
        let holds = [
            ("hold-in", self.hold_in_secs),
            ("hold-out", self.hold_out_secs),
        ];
        for (name, secs) in holds {
            if !secs.is_finite() || secs < 0.0 {
                return Err(BreathError::Pattern(format!(
                    "{} duration must be zero or positive, got {}",
                    name, secs
                )));
            }
        }
        Ok(())
    }

    /// Copy with every non-zero phase raised to the playable minimum and
    /// capped at the playable maximum
    pub fn clamped(&self) -> Self {
        fn clamp(secs: f32) -> f32 {
            if secs <= 0.0 {
                0.0
            } else {
                secs.clamp(MIN_PHASE_SECS, MAX_PHASE_SECS)
            }
        }
        Self {
            inhale_secs: clamp(self.inhale_secs).max(MIN_PHASE_SECS),
            hold_in_secs: clamp(self.hold_in_secs),
            exhale_secs: clamp(self.exhale_secs).max(MIN_PHASE_SECS),
            hold_out_secs: clamp(self.hold_out_secs),
        }
    }
}

impl fmt::Display for BreathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.inhale_secs, self.hold_in_secs, self.exhale_secs, self.hold_out_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_box() {
        let p = BreathPattern::default();
        assert_eq!(p, BreathPattern::preset("box").unwrap());
        assert_eq!(p.cycle_secs(), 16.0);
    }

    #[test]
    fn preset_lookup_case_insensitive() {
        assert!(BreathPattern::preset("BOX").is_some());
        assert!(BreathPattern::preset("  Relax ").is_some());
        assert!(BreathPattern::preset("478").is_some());
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(BreathPattern::preset("nope").is_none());
        assert!(BreathPattern::preset("").is_none());
    }

    #[test]
    fn preset_names_lists_all() {
        let names = BreathPattern::preset_names();
        assert!(names.contains(&"box"));
        assert!(names.contains(&"478"));
        assert!(names.contains(&"coherent"));
        assert!(names.contains(&"relax"));
    }

    #[test]
    fn four_seven_eight_cycle() {
        let p = BreathPattern::preset("478").unwrap();
        assert_eq!(p.cycle_secs(), 20.0);
        assert_eq!(p.inhale_secs, 4.0);
        assert_eq!(p.hold_in_secs, 7.0);
        assert_eq!(p.exhale_secs, 8.0);
        assert_eq!(p.hold_out_secs, 1.0);
    }

    #[test]
    fn validate_accepts_zero_holds() {
        let p = BreathPattern::new(5.0, 0.0, 5.0, 0.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_inhale() {
        let p = BreathPattern::new(0.0, 4.0, 4.0, 4.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_hold() {
        let p = BreathPattern::new(4.0, -1.0, 4.0, 4.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_finite() {
        assert!(BreathPattern::new(f32::NAN, 4.0, 4.0, 4.0).validate().is_err());
        assert!(BreathPattern::new(4.0, 4.0, f32::INFINITY, 4.0)
            .validate()
            .is_err());
    }

    #[test]
    fn clamped_raises_tiny_breathing_phases() {
        let p = BreathPattern::new(0.01, 0.0, 0.02, 0.0).clamped();
        assert_eq!(p.inhale_secs, MIN_PHASE_SECS);
        assert_eq!(p.exhale_secs, MIN_PHASE_SECS);
        assert_eq!(p.hold_in_secs, 0.0);
        assert_eq!(p.hold_out_secs, 0.0);
    }

    #[test]
    fn clamped_caps_huge_phases() {
        let p = BreathPattern::new(1e6, 1e6, 4.0, 4.0).clamped();
        assert_eq!(p.inhale_secs, MAX_PHASE_SECS);
        assert_eq!(p.hold_in_secs, MAX_PHASE_SECS);
    }

    #[test]
    fn clamped_keeps_normal_pattern() {
        let p = BreathPattern::default();
        assert_eq!(p.clamped(), p);
    }

    #[test]
    fn display_format() {
        assert_eq!(BreathPattern::default().to_string(), "4-4-4-4");
    }

    #[test]
    fn serde_roundtrip() {
        let p = BreathPattern::preset("relax").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: BreathPattern = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
