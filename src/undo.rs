/// Undo functionality for reverting recorded organize runs.
///
/// A transaction is undone by moving each of its files back from `new_path`
/// to `old_path`, newest move first, and then dropping the transaction from
/// the history.
use crate::error::Result;
use crate::history::{MoveOperation, Transaction, TransactionLog};
use std::fs;
use std::path::PathBuf;

/// Represents the result of an undo operation.
#[derive(Debug)]
pub struct UndoReport {
    /// The transaction that was undone.
    pub transaction_id: String,
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Files that could not be moved back, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
}

impl UndoReport {
    fn new(transaction_id: &str) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            restored_files: 0,
            failed_restores: Vec::new(),
        }
    }

    /// Returns true if every file was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty()
    }
}

/// Manages undo operations against a transaction log.
pub struct UndoManager<'a> {
    log: &'a TransactionLog,
}

impl<'a> UndoManager<'a> {
    pub fn new(log: &'a TransactionLog) -> Self {
        Self { log }
    }

    /// Undoes the transaction with the given ID.
    ///
    /// Restoration is best-effort: each file is renamed back without checking
    /// that it is still at its new location or that its old location is free,
    /// and failures are collected in the report. The transaction is removed
    /// from the history either way.
    ///
    /// An unknown ID is not an error and returns `Ok(None)`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use superd::history::TransactionLog;
    /// use superd::undo::UndoManager;
    ///
    /// let log = TransactionLog::new("/tmp/superd/history.json");
    /// match UndoManager::new(&log).undo("20260101T120000.000000") {
    ///     Ok(Some(report)) => println!("Restored {} files", report.restored_files),
    ///     Ok(None) => println!("Nothing to undo"),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(&self, transaction_id: &str) -> Result<Option<UndoReport>> {
        let Some(transaction) = self.log.find(transaction_id) else {
            log::debug!("No transaction {} in history", transaction_id);
            return Ok(None);
        };

        let report = Self::replay_reverse(&transaction);
        self.log.remove(&transaction.id)?;
        Ok(Some(report))
    }

    /// Undoes the newest transaction in the history, if any.
    pub fn undo_latest(&self) -> Result<Option<UndoReport>> {
        match self.log.list().into_iter().next() {
            Some(tx) => self.undo(&tx.id),
            None => Ok(None),
        }
    }

    fn replay_reverse(transaction: &Transaction) -> UndoReport {
        let mut report = UndoReport::new(&transaction.id);
        for operation in transaction.operations.iter().rev() {
            match Self::restore_file(operation) {
                Ok(()) => report.restored_files += 1,
                Err(reason) => {
                    log::warn!("Could not restore {}: {}", operation.old_path.display(), reason);
                    report.failed_restores.push((operation.new_path.clone(), reason));
                }
            }
        }
        report
    }

    /// Moves a single file back to where it came from.
    fn restore_file(operation: &MoveOperation) -> std::result::Result<(), String> {
        if let Some(parent) = operation.old_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Could not recreate {}: {}", parent.display(), e))?;
        }
        fs::rename(&operation.new_path, &operation.old_path)
            .map_err(|e| format!("Failed to restore file: {}", e))
    }
}
