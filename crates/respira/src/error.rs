//! Error types for the Respira engine
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for the Respira engine
#[derive(Error, Debug)]
pub enum BreathError {
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Invalid pattern: {0}")]
    Pattern(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the Respira engine
pub type Result<T> = std::result::Result<T, BreathError>;
