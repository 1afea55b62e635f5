//! Persisted application state.
//!
//! Three JSON files live in the per-user application directory:
//!
//! - `config.json`: view mode, watched folders and default conflict policy
//! - `schema.json`: the rule list
//! - `history.json`: the transaction log (see [`crate::history`])
//!
//! [`AppDirs`] holds the resolved directory and is passed explicitly to
//! everything that reads or writes these files. Missing or malformed config
//! and schema files load as defaults.

use crate::conflict::ConflictPolicy;
use crate::error::{Result, SuperdError};
use crate::history::TransactionLog;
use crate::rules::Schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the application directory.
pub const APP_DIR_ENV: &str = "SUPERD_HOME";

const CONFIG_FILE: &str = "config.json";
const SCHEMA_FILE: &str = "schema.json";
const HISTORY_FILE: &str = "history.json";

/// The resolved per-user application directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    root: PathBuf,
}

impl AppDirs {
    /// Uses `root` as the application directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the application directory and creates it if needed.
    ///
    /// Resolution order:
    /// 1. `override_dir`, if given
    /// 2. the `SUPERD_HOME` environment variable
    /// 3. `~/.superd`
    pub fn resolve(override_dir: Option<&Path>) -> Result<Self> {
        let root = match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => match std::env::var_os(APP_DIR_ENV) {
                Some(dir) if !dir.is_empty() => PathBuf::from(dir),
                _ => dirs::home_dir()
                    .ok_or(SuperdError::HomeDirNotFound)?
                    .join(".superd"),
            },
        };
        let app_dirs = Self::new(root);
        app_dirs.ensure()?;
        Ok(app_dirs)
    }

    /// Creates the directory (and any missing parents).
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| SuperdError::directory_creation_failed(&self.root, e))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn schema_path(&self) -> PathBuf {
        self.root.join(SCHEMA_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILE)
    }

    /// The transaction log stored in this directory.
    pub fn transaction_log(&self) -> TransactionLog {
        TransactionLog::new(self.history_path())
    }

    /// Loads `config.json`, or the defaults.
    pub fn load_config(&self) -> Config {
        read_json_or_default(&self.config_path(), Config::default)
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        write_json(&self.config_path(), config)
    }

    /// Loads `schema.json`, or the built-in rules.
    pub fn load_schema(&self) -> Schema {
        read_json_or_default(&self.schema_path(), Schema::default)
    }

    pub fn save_schema(&self, schema: &Schema) -> Result<()> {
        write_json(&self.schema_path(), schema)
    }
}

/// User preferences. Fields missing from the file take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub view_mode: String,
    pub watch_paths: Vec<PathBuf>,
    /// Kept as written so unknown values survive a save.
    pub conflict_mode: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            view_mode: "list".to_string(),
            watch_paths: vec![downloads_dir()],
            conflict_mode: "rename".to_string(),
        }
    }
}

impl Config {
    pub fn conflict_policy(&self) -> ConflictPolicy {
        ConflictPolicy::from(self.conflict_mode.as_str())
    }
}

/// Reads a schema from an arbitrary file.
pub fn import_schema(path: &Path) -> Result<Schema> {
    let bytes = fs::read(path).map_err(|e| SuperdError::read_failed(path, e))?;
    Schema::from_slice(&bytes)
}

/// Writes a schema to an arbitrary file.
pub fn export_schema(schema: &Schema, path: &Path) -> Result<()> {
    let bytes = schema.to_vec_pretty()?;
    fs::write(path, bytes).map_err(|e| SuperdError::write_failed(path, e))
}

/// The platform Downloads, Documents, Pictures and Videos directories.
pub fn system_paths() -> BTreeMap<&'static str, PathBuf> {
    let home = dirs::home_dir().unwrap_or_default();
    let mut paths = BTreeMap::new();
    paths.insert("Downloads", downloads_dir());
    paths.insert(
        "Documents",
        dirs::document_dir().unwrap_or_else(|| home.join("Documents")),
    );
    paths.insert(
        "Pictures",
        dirs::picture_dir().unwrap_or_else(|| home.join("Pictures")),
    );
    paths.insert(
        "Videos",
        dirs::video_dir().unwrap_or_else(|| home.join("Videos")),
    );
    paths
}

fn downloads_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join("Downloads"))
}

fn read_json_or_default<T, F>(path: &Path, default: F) -> T
where
    T: serde::de::DeserializeOwned,
    F: FnOnce() -> T,
{
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            log::debug!("Using defaults, could not read {}: {}", path.display(), e);
            return default();
        }
    };
    match serde_json::from_slice(&data) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Using defaults, {} is malformed: {}", path.display(), e);
            default()
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SuperdError::directory_creation_failed(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| SuperdError::write_failed(path, e))
}
