//! Error types shared by every part of the organizer.
//!
//! Most failure paths in the engine degrade to defaults (missing history,
//! malformed schema, unreadable scan directory). The variants here cover the
//! operations that do surface an error to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by superd operations.
#[derive(Error, Debug)]
pub enum SuperdError {
    #[error("Could not determine the user's home directory")]
    HomeDirNotFound,

    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid schema JSON: {source}")]
    InvalidSchema { source: serde_json::Error },

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to move {} to {}: {reason}", from.display(), to.display())]
    FileMoveFailed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("Copy of {} is incomplete: expected {expected} bytes, found {actual}", path.display())]
    CopyVerificationFailed {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

/// Convenience alias for results carrying a [`SuperdError`].
pub type Result<T> = std::result::Result<T, SuperdError>;

impl SuperdError {
    pub fn directory_creation_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreationFailed {
            path: path.into(),
            source,
        }
    }

    pub fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }

    pub fn file_move_failed(
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self::FileMoveFailed {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        }
    }
}
