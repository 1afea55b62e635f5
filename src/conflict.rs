//! Conflict handling for occupied destination paths.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Leave the source where it is.
    Skip,
    /// Prefix the file name with the current Unix timestamp, plus a `-N`
    /// suffix when that name is taken as well.
    Rename,
    /// Replace the existing file.
    Overwrite,
}

impl From<&str> for ConflictPolicy {
    /// `"skip"` and `"rename"` select those policies; anything else overwrites.
    fn from(value: &str) -> Self {
        match value {
            "skip" => Self::Skip,
            "rename" => Self::Rename,
            _ => Self::Overwrite,
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Skip => "skip",
            Self::Rename => "rename",
            Self::Overwrite => "overwrite",
        };
        f.write_str(name)
    }
}

impl ConflictPolicy {
    /// Decides the final destination, or `None` to skip the file.
    ///
    /// The existence check happens here, immediately before the move, and is
    /// not atomic with it: another process can still create the path in
    /// between.
    pub fn resolve(self, destination: &Path) -> Option<PathBuf> {
        if !destination.exists() {
            return Some(destination.to_path_buf());
        }
        self.resolve_existing(destination, chrono::Utc::now().timestamp())
    }

    /// Applies the policy to a destination known to be occupied.
    ///
    /// Rename prefixes the name with `unix_seconds`; if that name is taken too,
    /// a `-N` suffix is added before the extension.
    pub fn resolve_existing(self, destination: &Path, unix_seconds: i64) -> Option<PathBuf> {
        match self {
            Self::Skip => None,
            Self::Rename => {
                let file_name = destination.file_name()?.to_string_lossy();
                let renamed = format!("{}_{}", unix_seconds, file_name);
                Some(first_free(destination.with_file_name(renamed)))
            }
            Self::Overwrite => Some(destination.to_path_buf()),
        }
    }
}

/// Returns `path`, or `<stem>-N<.ext>` for the lowest `N` that is not taken.
fn first_free(path: PathBuf) -> PathBuf {
    if !path.exists() {
        return path;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let candidate = (1..)
        .map(|n| path.with_file_name(format!("{}-{}{}", stem, n, ext)))
        .find(|candidate| !candidate.exists());
    candidate.unwrap_or(path)
}
