//! Output formatting and styling module.
//!
//! All terminal output of the `superd` binary goes through [`OutputFormatter`],
//! so styling can change in one place.

use crate::history::Transaction;
use crate::scan::FileInfo;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Prints styled CLI output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use superd::output::OutputFormatter;
    /// OutputFormatter::success("Moved 3 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for an organize run over `total` files.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Prints scanned files as a name / size listing.
    pub fn file_list(files: &[FileInfo]) {
        let width = files.iter().map(|f| f.name.len()).max().unwrap_or(0).max(4);
        println!("{:<width$} | {}", "Name".bold(), "Size".bold(), width = width);
        println!("{}", "-".repeat(width + 14));
        for file in files {
            println!("{:<width$} | {} B", file.name, file.size, width = width);
        }
        println!("{}", "-".repeat(width + 14));
        println!("{} {}", files.len().to_string().green().bold(), plural(files.len()));
    }

    /// Prints how many files went into each destination directory.
    ///
    /// ```no_run
    /// use superd::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("/home/me/Downloads/Pictures".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 8);
    /// ```
    pub fn summary_table(dir_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = dir_counts.keys().map(|name| name.len()).max().unwrap_or(0).max(11);

        println!("{:<width$} | {}", "Destination".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));
        for (dir, count) in dir_counts {
            println!(
                "{:<width$} | {} {}",
                dir,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }

    /// Prints the transaction history, newest first.
    pub fn history(history: &[Transaction]) {
        if history.is_empty() {
            Self::info("No organize runs recorded.");
            return;
        }
        for tx in history {
            let when = chrono::DateTime::from_timestamp(tx.timestamp, 0)
                .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| tx.timestamp.to_string());
            println!(
                "{}  {}  {} {}",
                tx.id.bold(),
                when.dimmed(),
                tx.operations.len().to_string().green(),
                plural(tx.operations.len())
            );
            for op in &tx.operations {
                println!("    {} → {}", op.old_path.display(), op.new_path.display());
            }
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
