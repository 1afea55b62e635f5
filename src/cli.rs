//! Command-line interface module for superd.
//!
//! Parses the command line and drives the library: scanning, organizing
//! (optionally as a dry run), listing history, undo, and editing the
//! persisted schema and config.

use crate::config::{AppDirs, export_schema, import_schema, system_paths};
use crate::conflict::ConflictPolicy;
use crate::error::Result;
use crate::file_organizer::{FileOrganizer, MoveStatus};
use crate::output::OutputFormatter;
use crate::rules::Schema;
use crate::scan::scan_multiple_folders;
use crate::undo::{UndoManager, UndoReport};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "superd")]
#[command(about = "Sort folders into target directories by rule, with undo")]
#[command(version)]
pub struct Cli {
    /// Application directory holding config, schema and history
    #[arg(long, global = true, value_name = "DIR")]
    pub app_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the files directly inside one or more folders
    Scan {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Move files into their rule directories
    Organize {
        /// Folders to organize (defaults to the configured watch paths)
        paths: Vec<PathBuf>,
        /// What to do when the destination already exists
        #[arg(long, value_enum)]
        conflict: Option<ConflictPolicy>,
        /// Show where files would go without moving anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Show recorded organize runs, newest first
    History,
    /// Undo an organize run (the newest one if no ID is given)
    Undo { id: Option<String> },
    /// Inspect or edit the rule schema
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },
    /// Inspect or edit the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Print the platform user directories
    Paths,
}

#[derive(Subcommand, Debug)]
pub enum SchemaAction {
    /// Print the current schema as JSON
    Show,
    /// Write the current schema to a file
    Export { file: PathBuf },
    /// Replace the current schema with one read from a file
    Import { file: PathBuf },
    /// Restore the built-in rules
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Set the default conflict policy
    SetConflict {
        #[arg(value_enum)]
        mode: ConflictPolicy,
    },
    /// Add a folder to the watch paths
    AddPath { dir: PathBuf },
    /// Remove a folder from the watch paths
    RemovePath { dir: PathBuf },
}

/// Runs a parsed command line.
pub fn run_cli(cli: Cli) -> Result<()> {
    let app_dirs = AppDirs::resolve(cli.app_dir.as_deref())?;
    log::debug!("Using application directory {}", app_dirs.root().display());

    match cli.command {
        Command::Scan { paths } => {
            OutputFormatter::file_list(&scan_multiple_folders(&paths));
            Ok(())
        }
        Command::Organize {
            paths,
            conflict,
            dry_run,
        } => organize(&app_dirs, paths, conflict, dry_run),
        Command::History => {
            OutputFormatter::history(&app_dirs.transaction_log().list());
            Ok(())
        }
        Command::Undo { id } => undo(&app_dirs, id.as_deref()),
        Command::Schema { action } => schema(&app_dirs, action),
        Command::Config { action } => config(&app_dirs, action),
        Command::Paths => {
            for (name, path) in system_paths() {
                println!("{:<10} {}", name, path.display());
            }
            Ok(())
        }
    }
}

fn organize(
    app_dirs: &AppDirs,
    paths: Vec<PathBuf>,
    conflict: Option<ConflictPolicy>,
    dry_run: bool,
) -> Result<()> {
    let config = app_dirs.load_config();
    let schema = app_dirs.load_schema();
    let paths = if paths.is_empty() { config.watch_paths.clone() } else { paths };
    let policy = conflict.unwrap_or_else(|| config.conflict_policy());
    let log = app_dirs.transaction_log();
    let organizer = FileOrganizer::new(&schema, policy, &log);

    if dry_run {
        OutputFormatter::dry_run_notice(&format!("conflict policy: {}", policy));
        let plan = organizer.plan(&paths);
        if plan.is_empty() {
            OutputFormatter::info("No files found to organize.");
        }
        for planned in &plan {
            match &planned.destination {
                Some(dest) => println!(" - {} → {}", planned.file.name, dest.display()),
                None => println!(" - {} (skipped, destination exists)", planned.file.name),
            }
        }
        OutputFormatter::dry_run_notice("No files were modified.");
        return Ok(());
    }

    for path in &paths {
        OutputFormatter::info(&format!("Organizing contents of: {}", path.display()));
    }

    let total = scan_multiple_folders(&paths).len() as u64;
    let pb = OutputFormatter::create_progress_bar(total);
    let report = organizer.organize_with(&paths, |outcome| {
        if let Some(name) = outcome.source.file_name() {
            pb.set_message(name.to_string_lossy().to_string());
        }
        pb.inc(1);
    });
    pb.finish_and_clear();

    let mut dir_counts: BTreeMap<String, usize> = BTreeMap::new();
    for op in report.moved() {
        if let Some(parent) = op.new_path.parent() {
            *dir_counts.entry(parent.display().to_string()).or_insert(0) += 1;
        }
    }
    for outcome in &report.outcomes {
        if let MoveStatus::Skipped { destination } = &outcome.status {
            OutputFormatter::warning(&format!(
                "Skipped {}: {} already exists",
                outcome.source.display(),
                destination.display()
            ));
        }
    }
    for (path, reason) in report.failures() {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }

    if report.moved_count() == 0 {
        OutputFormatter::info("Nothing was moved.");
        return Ok(());
    }

    OutputFormatter::summary_table(&dir_counts, report.moved_count());
    match &report.transaction {
        Some(tx) => OutputFormatter::success(&format!(
            "History saved. Use 'superd undo {}' to revert changes.",
            tx.id
        )),
        None => OutputFormatter::warning("History could not be saved; undo will not be available."),
    }
    Ok(())
}

fn undo(app_dirs: &AppDirs, id: Option<&str>) -> Result<()> {
    let log = app_dirs.transaction_log();
    let manager = UndoManager::new(&log);
    let report = match id {
        Some(id) => manager.undo(id)?,
        None => manager.undo_latest()?,
    };

    match report {
        Some(report) => print_undo_report(&report),
        None => OutputFormatter::info("Nothing to undo."),
    }
    Ok(())
}

fn print_undo_report(report: &UndoReport) {
    OutputFormatter::success(&format!(
        "Undid {}: restored {} {}",
        report.transaction_id,
        report.restored_files,
        if report.restored_files == 1 { "file" } else { "files" }
    ));
    for (path, reason) in &report.failed_restores {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }
}

fn schema(app_dirs: &AppDirs, action: SchemaAction) -> Result<()> {
    match action {
        SchemaAction::Show => {
            let bytes = app_dirs.load_schema().to_vec_pretty()?;
            OutputFormatter::plain(&String::from_utf8_lossy(&bytes));
        }
        SchemaAction::Export { file } => {
            export_schema(&app_dirs.load_schema(), &file)?;
            OutputFormatter::success(&format!("Rules exported to {}", file.display()));
        }
        SchemaAction::Import { file } => {
            let schema = import_schema(&file)?;
            app_dirs.save_schema(&schema)?;
            OutputFormatter::success(&format!("Imported {} rules", schema.rules.len()));
        }
        SchemaAction::Reset => {
            app_dirs.save_schema(&Schema::default())?;
            OutputFormatter::success("Restored the built-in rules");
        }
    }
    Ok(())
}

fn config(app_dirs: &AppDirs, action: ConfigAction) -> Result<()> {
    let mut config = app_dirs.load_config();
    match action {
        ConfigAction::Show => {
            OutputFormatter::plain(&serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        ConfigAction::SetConflict { mode } => {
            config.conflict_mode = mode.to_string();
        }
        ConfigAction::AddPath { dir } => {
            if !config.watch_paths.contains(&dir) {
                config.watch_paths.push(dir);
            }
        }
        ConfigAction::RemovePath { dir } => {
            config.watch_paths.retain(|p| p != &dir);
        }
    }
    app_dirs.save_config(&config)?;
    OutputFormatter::success("Configuration saved");
    Ok(())
}
