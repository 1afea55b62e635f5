//! Directory scanning.
//!
//! Produces read-only snapshots of the immediate file entries of a directory.
//! A snapshot goes stale as soon as the underlying directory changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A file entry captured at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// The file name, without its directory.
    pub name: String,
    /// Lowercased extension including the leading dot, or empty.
    pub extension: String,
    /// Size in bytes.
    pub size: u64,
    /// The full path to the file.
    pub full_path: PathBuf,
}

impl FileInfo {
    /// The directory the file was found in.
    pub fn parent_dir(&self) -> &Path {
        self.full_path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Returns the lowercased extension of `file_name`, starting at the last dot.
///
/// A name with no dot has an empty extension. A leading-dot name such as
/// `.bashrc` is all extension.
///
/// ```
/// use superd::scan::extension_of;
///
/// assert_eq!(extension_of("Photo.JPG"), ".jpg");
/// assert_eq!(extension_of("archive.tar.gz"), ".gz");
/// assert_eq!(extension_of("Makefile"), "");
/// ```
pub fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) => file_name[idx..].to_lowercase(),
        None => String::new(),
    }
}

/// Lists the immediate files of `dir`, sorted by name.
///
/// Subdirectories are skipped, never descended into. An unreadable directory
/// yields an empty list.
pub fn scan_folder(dir: &Path) -> Vec<FileInfo> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Skipping unreadable directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<FileInfo> = entries
        .flatten()
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if metadata.is_dir() {
                return None;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            Some(FileInfo {
                extension: extension_of(&name),
                size: metadata.len(),
                full_path: dir.join(&name),
                name,
            })
        })
        .collect();

    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

/// Scans each directory in turn and concatenates the results.
pub fn scan_multiple_folders<P: AsRef<Path>>(dirs: &[P]) -> Vec<FileInfo> {
    dirs.iter()
        .flat_map(|dir| scan_folder(dir.as_ref()))
        .collect()
}
