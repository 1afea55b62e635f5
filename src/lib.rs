//! superd - rule-driven file organization with undo
//!
//! This library scans folders, decides a destination directory for each file
//! from an ordered set of rules, moves the files while handling name
//! conflicts, and records every run as a transaction that can be undone.

pub mod cli;
pub mod config;
pub mod conflict;
pub mod error;
pub mod file_organizer;
pub mod history;
pub mod output;
pub mod rules;
pub mod scan;
pub mod undo;

pub use config::{AppDirs, Config};
pub use conflict::ConflictPolicy;
pub use error::{Result, SuperdError};
pub use file_organizer::{FileOrganizer, FileOutcome, MoveStatus, OrganizeReport};
pub use history::{MoveOperation, Transaction, TransactionLog};
pub use rules::{Rule, RuleMatcher, Schema};
pub use scan::{FileInfo, scan_folder, scan_multiple_folders};
pub use undo::{UndoManager, UndoReport};

pub use cli::{Cli, run_cli};
