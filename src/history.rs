/// Transaction log for organize runs.
///
/// Every organize run that moves at least one file is recorded as a
/// [`Transaction`] in a JSON history file, newest first and capped at
/// [`MAX_HISTORY`] entries. The file is the only durable record of what moved
/// where. Reads are best-effort: a missing or corrupt file is an empty history.
///
/// The log is a single-writer resource. Each write is a full read-modify-write
/// of the file, so two concurrent writers lose updates.
use crate::error::{Result, SuperdError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of transactions kept in the history.
pub const MAX_HISTORY: usize = 30;

/// One completed relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOperation {
    pub file_name: String,
    pub old_path: PathBuf,
    pub new_path: PathBuf,
}

/// A batch of moves performed by a single organize run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique within the history.
    pub id: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Moves in the order they were performed.
    pub operations: Vec<MoveOperation>,
}

/// Handle on the history file.
#[derive(Debug, Clone)]
pub struct TransactionLog {
    path: PathBuf,
}

impl TransactionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the history, newest first.
    ///
    /// Any read or parse failure yields an empty history.
    pub fn list(&self) -> Vec<Transaction> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) => {
                log::debug!("No history at {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };
        serde_json::from_slice(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable history {}: {}", self.path.display(), e);
            Vec::new()
        })
    }

    /// Records a batch as the newest transaction and returns it.
    ///
    /// The oldest entries beyond [`MAX_HISTORY`] are evicted.
    pub fn record(&self, operations: Vec<MoveOperation>) -> Result<Transaction> {
        let mut history = self.list();
        let now = chrono::Utc::now();
        let transaction = Transaction {
            id: unique_id(&now.format("%Y%m%dT%H%M%S%.6f").to_string(), &history),
            timestamp: now.timestamp(),
            operations,
        };

        history.insert(0, transaction.clone());
        history.truncate(MAX_HISTORY);
        self.write(&history)?;

        log::debug!(
            "Recorded transaction {} with {} operations",
            transaction.id,
            transaction.operations.len()
        );
        Ok(transaction)
    }

    /// Looks up a transaction by ID.
    pub fn find(&self, id: &str) -> Option<Transaction> {
        self.list().into_iter().find(|tx| tx.id == id)
    }

    /// Removes a transaction by ID and persists the shortened history.
    ///
    /// Returns the removed transaction, or `None` when the ID is unknown, in
    /// which case the file is not rewritten.
    pub fn remove(&self, id: &str) -> Result<Option<Transaction>> {
        let mut history = self.list();
        let Some(index) = history.iter().position(|tx| tx.id == id) else {
            return Ok(None);
        };
        let removed = history.remove(index);
        self.write(&history)?;
        Ok(Some(removed))
    }

    fn write(&self, history: &[Transaction]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| SuperdError::directory_creation_failed(parent, e))?;
        }
        let json = serde_json::to_string_pretty(history)?;
        fs::write(&self.path, json).map_err(|e| SuperdError::write_failed(&self.path, e))
    }
}

/// Appends `-N` to `base` until it no longer collides with a recorded ID.
fn unique_id(base: &str, history: &[Transaction]) -> String {
    let taken = |candidate: &str| history.iter().any(|tx| tx.id == candidate);
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}
