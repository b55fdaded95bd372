//! Crate-wide error type
//!
//! Startup failures (display, resources) are fatal and surface from
//! `GameDriver::init`. Everything else in the core recovers locally.

use std::fmt;

/// Errors raised by the game core and its configuration layer.
#[derive(Debug)]
pub enum GameError {
    /// The presentation layer cannot open a window of this size.
    DisplayUnavailable { width: u32, height: u32, reason: String },

    /// A texture or model could not be loaded during `init`.
    ResourceLoad { path: String, reason: String },

    /// An entity with this key is already registered.
    DuplicateEntity(String),

    /// Filesystem error while reading/writing settings or high scores.
    Io(std::io::Error),

    /// Malformed JSON in settings or high scores.
    Format(serde_json::Error),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DisplayUnavailable { width, height, reason } => {
                write!(f, "Display mode {}x{} not available: {}", width, height, reason)
            }
            Self::ResourceLoad { path, reason } => {
                write!(f, "Failed to load resource '{}': {}", path, reason)
            }
            Self::DuplicateEntity(key) => write!(f, "Entity '{}' is already registered", key),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Format(e) => write!(f, "Invalid JSON: {}", e),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GameError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for GameError {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(e)
    }
}
