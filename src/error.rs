//! Error types for toolkit operations.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum LanshieldError {
    #[error("Command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    #[error("Failed to parse output: {0}")]
    ParseError(String),

    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LanshieldError>;

/// Result of a user-facing mutation: did it apply, and what to tell the user.
///
/// Validation failures (bad domain, bad time range, index out of bounds) are
/// ordinary `Outcome`s with `ok == false`, never `Err` — only storage and
/// command failures surface as `LanshieldError`.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub ok: bool,
    pub message: String,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}
