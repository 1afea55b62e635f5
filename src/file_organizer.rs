/// Moves scanned files into the directories chosen by the rule matcher.
///
/// Each file is classified, checked for a destination conflict and moved. The
/// move is a rename when possible and a verified copy followed by deleting
/// the source otherwise (e.g. across volumes). Every file gets a
/// [`FileOutcome`]; the successful moves of a run are recorded as one
/// transaction in the [`TransactionLog`].
use crate::conflict::ConflictPolicy;
use crate::error::{Result, SuperdError};
use crate::history::{MoveOperation, Transaction, TransactionLog};
use crate::rules::{RuleMatcher, Schema};
use crate::scan::{FileInfo, scan_folder};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// What happened to a single file during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveStatus {
    /// The file was relocated.
    Moved(MoveOperation),
    /// The destination was occupied and the policy said to leave the file.
    Skipped { destination: PathBuf },
    /// The file could not be relocated and is still at its source path.
    Failed { reason: String },
}

/// The outcome for one scanned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub status: MoveStatus,
}

/// Result of an organize run.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    pub outcomes: Vec<FileOutcome>,
    /// The recorded transaction, if anything moved and the history was written.
    pub transaction: Option<Transaction>,
}

impl OrganizeReport {
    /// Number of files moved.
    pub fn moved_count(&self) -> usize {
        self.moved().count()
    }

    pub fn moved(&self) -> impl Iterator<Item = &MoveOperation> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            MoveStatus::Moved(op) => Some(op),
            _ => None,
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, MoveStatus::Skipped { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            MoveStatus::Failed { reason } => Some((o.source.as_path(), reason.as_str())),
            _ => None,
        })
    }
}

/// A planned move, produced without touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub file: FileInfo,
    /// Final destination, or `None` when the file would be skipped.
    pub destination: Option<PathBuf>,
}

/// Organizes directories according to a rule schema.
pub struct FileOrganizer<'a> {
    matcher: RuleMatcher,
    policy: ConflictPolicy,
    log: &'a TransactionLog,
}

impl<'a> FileOrganizer<'a> {
    pub fn new(schema: &Schema, policy: ConflictPolicy, log: &'a TransactionLog) -> Self {
        Self {
            matcher: RuleMatcher::new(schema),
            policy,
            log,
        }
    }

    /// Organizes every target directory and records the moves.
    ///
    /// Failed files do not stop the run and are not rolled back; the
    /// successful moves are still recorded.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use superd::conflict::ConflictPolicy;
    /// use superd::file_organizer::FileOrganizer;
    /// use superd::history::TransactionLog;
    /// use superd::rules::Schema;
    /// use std::path::Path;
    ///
    /// let log = TransactionLog::new("/tmp/superd/history.json");
    /// let organizer = FileOrganizer::new(&Schema::default(), ConflictPolicy::Rename, &log);
    /// let report = organizer.organize(&[Path::new("/home/me/Downloads")]);
    /// println!("Moved {} files", report.moved_count());
    /// ```
    pub fn organize<P: AsRef<Path>>(&self, target_paths: &[P]) -> OrganizeReport {
        self.organize_with(target_paths, |_| {})
    }

    /// Like [`organize`](Self::organize), calling `on_file` after each file.
    pub fn organize_with<P, F>(&self, target_paths: &[P], mut on_file: F) -> OrganizeReport
    where
        P: AsRef<Path>,
        F: FnMut(&FileOutcome),
    {
        let mut report = OrganizeReport::default();

        for target in target_paths {
            for file in scan_folder(target.as_ref()) {
                let outcome = self.organize_file(&file);
                on_file(&outcome);
                report.outcomes.push(outcome);
            }
        }

        let operations: Vec<MoveOperation> = report.moved().cloned().collect();
        if !operations.is_empty() {
            match self.log.record(operations) {
                Ok(tx) => report.transaction = Some(tx),
                Err(e) => log::warn!("Moves were made but could not be recorded: {}", e),
            }
        }

        report
    }

    /// Computes where every file would go, without moving anything.
    pub fn plan<P: AsRef<Path>>(&self, target_paths: &[P]) -> Vec<PlannedMove> {
        target_paths
            .iter()
            .flat_map(|target| scan_folder(target.as_ref()))
            .map(|file| {
                let dest = self.matcher.destination_dir(&file).join(&file.name);
                let destination = self.policy.resolve(&dest);
                PlannedMove { file, destination }
            })
            .collect()
    }

    fn organize_file(&self, file: &FileInfo) -> FileOutcome {
        let source = file.full_path.clone();
        let status = match self.try_organize_file(file) {
            Ok(Some(op)) => MoveStatus::Moved(op),
            Ok(None) => MoveStatus::Skipped {
                destination: self.matcher.destination_dir(file).join(&file.name),
            },
            Err(e) => {
                log::warn!("{}", e);
                MoveStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        FileOutcome { source, status }
    }

    fn try_organize_file(&self, file: &FileInfo) -> Result<Option<MoveOperation>> {
        let dest_dir = self.matcher.destination_dir(file);
        fs::create_dir_all(&dest_dir)
            .map_err(|e| SuperdError::directory_creation_failed(&dest_dir, e))?;

        let Some(destination) = self.policy.resolve(&dest_dir.join(&file.name)) else {
            log::debug!("Skipping {}: destination exists", file.full_path.display());
            return Ok(None);
        };

        move_file(&file.full_path, &destination)?;

        Ok(Some(MoveOperation {
            file_name: file.name.clone(),
            old_path: file.full_path.clone(),
            new_path: destination,
        }))
    }
}

/// Moves `source` to `destination`.
///
/// Tries a rename first and falls back to `copy_then_remove` when that
/// fails, e.g. across volumes.
pub fn move_file(source: &Path, destination: &Path) -> Result<()> {
    let rename_err = match fs::rename(source, destination) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    log::debug!(
        "Rename {} -> {} failed ({}), falling back to copy",
        source.display(),
        destination.display(),
        rename_err
    );
    copy_then_remove(source, destination)
}

/// Copies `source` into a temporary file next to `destination`, checks its
/// length, swaps it into place and then deletes `source`.
///
/// Until the swap, `destination` is never written: on failure only the
/// temporary file is discarded, and `source` and any file already at
/// `destination` keep their contents. If the source cannot be deleted after
/// the swap, an error is returned and both copies remain.
pub(crate) fn copy_then_remove(source: &Path, destination: &Path) -> Result<()> {
    let fail = |reason: String| SuperdError::file_move_failed(source, destination, reason);
    let dest_dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut input = fs::File::open(source).map_err(|e| fail(e.to_string()))?;
    let expected = input.metadata().map_err(|e| fail(e.to_string()))?.len();

    let mut temp = NamedTempFile::new_in(dest_dir).map_err(|e| fail(e.to_string()))?;
    io::copy(&mut input, temp.as_file_mut()).map_err(|e| fail(e.to_string()))?;
    temp.as_file().sync_all().map_err(|e| fail(e.to_string()))?;
    verify_copy(temp.path(), expected)?;

    temp.persist(destination).map_err(|e| fail(e.error.to_string()))?;

    fs::remove_file(source)
        .map_err(|e| fail(format!("copied but could not remove source: {}", e)))
}

fn verify_copy(destination: &Path, expected: u64) -> Result<()> {
    let actual = fs::metadata(destination)
        .map_err(|e| SuperdError::read_failed(destination, e))?
        .len();
    if actual != expected {
        return Err(SuperdError::CopyVerificationFailed {
            path: destination.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}
